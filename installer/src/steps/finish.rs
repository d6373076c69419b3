use anyhow::Result;
use log::info;

use crate::models::{Feedback, FieldDescriptor, FieldValues};

use super::StepController;

pub struct FinishStep;

impl StepController for FinishStep {
    fn id(&self) -> &str {
        "finish"
    }

    fn priority(&self) -> i32 {
        99
    }

    fn task_name(&self) -> String {
        "Thank you for installing this product".to_string()
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::info(
            "summary",
            "",
            "Press Complete to finish the installation.",
        )]
    }

    fn advance(&self, _input: &FieldValues) -> Result<Option<Feedback>> {
        info!("[PHASE: wizard] [STEP: finish] Installation completed");
        Ok(None)
    }
}
