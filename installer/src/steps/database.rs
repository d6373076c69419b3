// Database setup step
//
// Collects connection settings and, when an output path is configured, writes them to an
// env-style file. Validation failures are returned as feedback, never as errors.

use anyhow::Result;
use log::{debug, error, info};
use std::path::PathBuf;

use crate::models::{Feedback, FieldDescriptor, FieldValue, FieldValues};
use crate::utils::logging::{mask_env_line, mask_sensitive};

use super::StepController;

const REQUIRED_TEXT: [(&str, &str); 3] = [
    ("db_host", "Database host is required."),
    ("db_name", "Database name is required."),
    ("db_user", "Database user is required."),
];

pub struct DatabaseStep {
    env_output: Option<PathBuf>,
}

impl DatabaseStep {
    pub fn new(env_output: Option<PathBuf>) -> Self {
        Self { env_output }
    }

    fn render_env(input: &FieldValues) -> String {
        let mut out = String::new();
        for (key, value) in input {
            let rendered = match value {
                FieldValue::Bool(b) => b.to_string(),
                FieldValue::Text(s) => s.clone(),
            };
            out.push_str(&format!("{}={}\n", key.to_ascii_uppercase(), rendered));
        }
        out
    }
}

impl StepController for DatabaseStep {
    fn id(&self) -> &str {
        "database"
    }

    fn priority(&self) -> i32 {
        2
    }

    fn task_name(&self) -> String {
        "Database Setup".to_string()
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("db_host", "Database Host", "localhost").required(),
            FieldDescriptor::text("db_name", "Database Name", "").required(),
            FieldDescriptor::text("db_user", "Database User", "").required(),
            FieldDescriptor::password("db_password", "Database Password"),
            FieldDescriptor::email("admin_email", "Administrator E-mail", ""),
            FieldDescriptor::checkbox("accept_terms", "I accept the terms and conditions", false)
                .required(),
            FieldDescriptor::select(
                "engine",
                "Database engine",
                &["postgres", "mysql", "sqlite"],
                "postgres",
            )
            .required(),
            FieldDescriptor::info(
                "note",
                "Important Information",
                "The credentials are only used to create the application schema.",
            ),
        ]
    }

    fn advance(&self, input: &FieldValues) -> Result<Option<Feedback>> {
        for (key, message) in REQUIRED_TEXT {
            if input.get(key).map_or(true, FieldValue::is_empty) {
                return Ok(Some(Feedback::error(message)));
            }
        }
        if input.get("accept_terms").and_then(FieldValue::as_bool) != Some(true) {
            return Ok(Some(Feedback::error(
                "You must accept the terms and conditions.",
            )));
        }
        if input.get("engine").map_or(true, FieldValue::is_empty) {
            return Ok(Some(Feedback::error("You must choose a database engine.")));
        }

        let user = input
            .get("db_user")
            .and_then(FieldValue::as_text)
            .unwrap_or_default();
        info!(
            "[PHASE: wizard] [STEP: database] Database settings accepted (user={})",
            mask_sensitive(user)
        );

        if let Some(path) = &self.env_output {
            let env = Self::render_env(input);
            for line in env.lines() {
                debug!("env: {}", mask_env_line(line));
            }
            if let Err(e) = std::fs::write(path, env) {
                error!(
                    "[PHASE: wizard] [STEP: database] Failed to write {:?}: {}",
                    path, e
                );
                return Ok(Some(Feedback::error(
                    "Failed to write to configuration file.",
                )));
            }
            info!(
                "[PHASE: wizard] [STEP: database] Wrote settings to {:?}",
                path
            );
        }

        Ok(None)
    }
}
