// Runtime settings
//
// Layered: embedded defaults -> `install-wizard.toml` in the working directory -> explicit
// `--config` file -> `INSTALL_WIZARD__*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::DEFAULT_SESSION_TIMEOUT_SECS;
use crate::steps::registry::MAX_STEPS;

pub const ENV_PREFIX: &str = "INSTALL_WIZARD";
pub const LOCAL_CONFIG_FILE: &str = "install-wizard.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub wizard: WizardSettings,
    #[serde(default)]
    pub web: WebSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSettings {
    /// Step names, resolved against the built-in catalog. Order is decided by priority.
    #[serde(default = "default_steps")]
    pub steps: Vec<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    /// Where the database step writes its `KEY=value` file. Nothing is written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_output: Option<PathBuf>,
}

fn default_steps() -> Vec<String> {
    vec![
        "welcome".to_string(),
        "database".to_string(),
        "finish".to_string(),
    ]
}

fn default_max_steps() -> usize {
    MAX_STEPS
}

fn default_session_timeout_secs() -> u64 {
    DEFAULT_SESSION_TIMEOUT_SECS.unsigned_abs()
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            max_steps: default_max_steps(),
            session_timeout_secs: default_session_timeout_secs(),
            env_output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Where the browser is sent after `complete` on the last step. Unset keeps the
    /// browser on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_url: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            completion_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub backend: SessionBackend,
    /// Folder for the file backend. Defaults to the per-user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            level: default_log_level(),
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Debug)
    }
}

impl Settings {
    /// Load settings from all layers.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_from(config_path, Path::new(LOCAL_CONFIG_FILE))
    }

    fn load_from(config_path: Option<&str>, local_config: &Path) -> Result<Self> {
        // Start with embedded defaults so the wizard runs without any config file
        let defaults = Settings::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default settings")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config.to_path_buf()));
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("wizard.steps"),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.wizard.steps.is_empty() {
            anyhow::bail!("wizard.steps must name at least one step");
        }
        if self.wizard.max_steps == 0 || self.wizard.max_steps > MAX_STEPS {
            anyhow::bail!("wizard.max_steps must be between 1 and {}", MAX_STEPS);
        }
        if self.wizard.session_timeout_secs == 0 {
            anyhow::bail!("wizard.session_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn session_timeout(&self) -> chrono::Duration {
        let max = i64::MAX / 1000;
        let secs = i64::try_from(self.wizard.session_timeout_secs)
            .unwrap_or(max)
            .min(max);
        chrono::Duration::seconds(secs)
    }

    /// Effective settings rendered as TOML (`--print-config`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render settings as TOML")
    }
}
