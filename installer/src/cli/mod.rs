//! Interactive terminal driver.
//!
//! Runs the whole step sequence in one process: print the step header, prompt for each
//! field, confirm, submit. Invalid answers restart the step; controller feedback is shown
//! on the next render of the same step.

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use uuid::Uuid;

use crate::engine::{Action, RenderOutcome, StepFlowEngine, StepPage, Submission, SubmitOutcome};
use crate::models::{FeedbackKind, FieldDescriptor, FieldKind, FieldValue};
use crate::utils::validation::{resolve_field, InputMode, RawInput, RawValue};

pub mod prompt;

pub use prompt::{Prompter, StdioPrompter};

/// Consecutive redirects tolerated before the loop is considered stuck.
const MAX_REDIRECTS: usize = 3;

pub struct TerminalDriver<'a, P: Prompter> {
    engine: &'a StepFlowEngine,
    prompter: P,
    session_id: String,
}

enum Collected {
    Input(RawInput),
    Retry,
}

impl<'a, P: Prompter> TerminalDriver<'a, P> {
    pub fn new(engine: &'a StepFlowEngine, prompter: P) -> Self {
        Self {
            engine,
            prompter,
            session_id: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Run to completion. Any error returned here is fatal for the run.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "[PHASE: cli] [STEP: start] Terminal installation with {} step(s)",
            self.engine.total_steps()
        );
        let result = self.step_loop();
        if let Err(e) = &result {
            error!("[PHASE: cli] [STEP: abort] {:#}", e);
            // Best effort; the run already failed.
            let _ = self.engine.destroy(&self.session_id);
        }
        result
    }

    fn step_loop(&mut self) -> Result<()> {
        let mut requested = 1;
        let mut redirects = 0;
        loop {
            let page = match self.engine.render_step(&self.session_id, requested)? {
                RenderOutcome::Page(page) => page,
                RenderOutcome::Redirect(step) => {
                    redirects += 1;
                    if redirects > MAX_REDIRECTS {
                        return Err(anyhow!("Step {} could not be rendered", requested));
                    }
                    requested = step;
                    continue;
                }
            };
            redirects = 0;
            requested = page.step;

            self.show_header(&page)?;
            let input = match self.collect(&page)? {
                Collected::Input(input) => input,
                Collected::Retry => continue,
            };

            let confirm = self.read("\nPlease confirm your inputs (y/n): ")?;
            if !matches!(confirm.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
                self.prompter.say("\nRestarting this step...")?;
                continue;
            }

            let action = if page.navigation.show_complete {
                Action::Complete
            } else {
                Action::Next
            };
            let submission = Submission {
                action,
                input,
                mode: InputMode::Interactive,
                token: Some(page.token.clone()),
            };
            match self.engine.submit(&self.session_id, submission) {
                Ok(SubmitOutcome::Redirect(step)) => requested = step,
                Ok(SubmitOutcome::Reset) => requested = 1,
                Ok(SubmitOutcome::Completed(_)) => break,
                Err(e) if !e.is_fatal() => {
                    warn!("[PHASE: cli] [STEP: submit] {}", e);
                    self.prompter.say(&format!("\n[ERROR] {}", e))?;
                    requested = e.redirect_step().unwrap_or(1);
                }
                Err(e) => return Err(e).context("Installation step failed"),
            }
        }

        self.prompter.say("=== Installation Complete ===\n")?;
        self.prompter
            .say("All installation steps have been completed successfully.")?;
        self.engine.destroy(&self.session_id)?;
        info!("[PHASE: cli] [STEP: complete] Terminal installation finished");
        Ok(())
    }

    fn show_header(&mut self, page: &StepPage) -> Result<()> {
        self.prompter.say(&format!(
            "=== Step {} of {}: {} ===\n",
            page.step, page.total_steps, page.task_name
        ))?;
        if let Some(feedback) = &page.feedback {
            let tag = match feedback.kind {
                FeedbackKind::Error => "[ERROR]",
                FeedbackKind::Info => "[INFO]",
            };
            self.prompter
                .say(&format!("{} {}\n", tag, feedback.message))?;
        }
        Ok(())
    }

    /// Prompt for every field. An invalid answer aborts collection and restarts the step.
    fn collect(&mut self, page: &StepPage) -> Result<Collected> {
        let mut input = RawInput::new();
        for field in &page.fields {
            let answer = match field.kind {
                FieldKind::Info => {
                    self.prompter.say(&format!("{}\n", field.value))?;
                    continue;
                }
                FieldKind::Password => {
                    let shown = field
                        .value
                        .as_text()
                        .map(|v| "*".repeat(v.chars().count()))
                        .unwrap_or_default();
                    self.read_secret(&format!("{} [{}]: ", field.label, shown))?
                }
                FieldKind::Checkbox => self.read(&format!(
                    "{} (yes/no) [{}]: ",
                    field.label, field.value
                ))?,
                FieldKind::Select => {
                    self.prompter.say(&field.label)?;
                    for (i, option) in field.options.iter().enumerate() {
                        self.prompter.say(&format!("{}) {}", i + 1, option))?;
                    }
                    self.read(&format!("Choose option [{}]: ", default_index(field)))?
                }
                FieldKind::Text | FieldKind::Email => {
                    self.read(&format!("{} [{}]: ", field.label, field.value))?
                }
            };

            let raw = RawValue::Text(answer.trim().to_string());
            if let Err(message) = resolve_field(field, Some(&raw), InputMode::Interactive) {
                self.prompter.say(&format!("\n[ERROR] {}", message))?;
                self.read("Press Enter to try again...")?;
                return Ok(Collected::Retry);
            }
            input.insert(field.key.clone(), raw);
        }
        Ok(Collected::Input(input))
    }

    fn read(&mut self, prompt: &str) -> Result<String> {
        self.prompter
            .ask(prompt)?
            .ok_or_else(|| anyhow!("Input closed before the installation finished"))
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        self.prompter
            .ask_secret(prompt)?
            .ok_or_else(|| anyhow!("Input closed before the installation finished"))
    }
}

fn default_index(field: &FieldDescriptor) -> usize {
    match &field.value {
        FieldValue::Text(v) => field.options.iter().position(|o| o == v).map_or(1, |i| i + 1),
        FieldValue::Bool(_) => 1,
    }
}
