use anyhow::Result;
use log::info;

use crate::models::{Feedback, FieldDescriptor, FieldValues};

use super::StepController;

pub struct WelcomeStep;

impl StepController for WelcomeStep {
    fn id(&self) -> &str {
        "welcome"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn task_name(&self) -> String {
        "Welcome".to_string()
    }

    fn initialize(&self) -> Result<()> {
        info!("[PHASE: wizard] [STEP: welcome] Starting installation");
        Ok(())
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::info(
                "intro",
                "",
                "Welcome! This wizard walks you through the installation.",
            ),
            FieldDescriptor::select(
                "edition",
                "Edition",
                &["standard", "professional", "enterprise"],
                "standard",
            ),
            FieldDescriptor::text("instance_name", "Instance name", "localhost"),
            FieldDescriptor::checkbox("send_usage", "Send anonymous usage statistics", true),
        ]
    }

    fn advance(&self, _input: &FieldValues) -> Result<Option<Feedback>> {
        Ok(None)
    }

    fn reset(&self) -> Result<()> {
        info!("[PHASE: wizard] [STEP: welcome] Installation reset");
        Ok(())
    }
}
