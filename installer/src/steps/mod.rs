//! Installation steps.
//!
//! Each page of the wizard is backed by one `StepController`. Controllers are stateless:
//! anything that must survive between calls lives in the session store, and the registry
//! builds a fresh instance for every lookup.

use anyhow::Result;
use std::sync::Arc;

use crate::config::WizardSettings;
use crate::models::{Feedback, FieldDescriptor, FieldValues};

pub mod database;
pub mod finish;
pub mod registry;
pub mod welcome;

pub use registry::ControllerRegistry;

/// Hooks implemented by every installation step.
///
/// `advance`/`retreat` return `Ok(Some(feedback))` to reject the submission with a message
/// shown to the user; `Err(_)` is reserved for faults that should abort the operation.
pub trait StepController: Send + Sync {
    /// Stable identity used as the key for this step's saved values.
    fn id(&self) -> &str;

    /// Sort key (ascending). Not required to be unique.
    fn priority(&self) -> i32;

    fn task_name(&self) -> String;

    /// Runs before the step is rendered. Failures are logged, never fatal.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn fields(&self) -> Vec<FieldDescriptor>;

    fn advance(&self, input: &FieldValues) -> Result<Option<Feedback>>;

    fn retreat(&self, _input: &FieldValues) -> Result<Option<Feedback>> {
        Ok(None)
    }

    /// Best-effort cleanup when the whole installation is reset.
    fn reset(&self) -> Result<()> {
        Ok(())
    }
}

pub type StepFactory = Arc<dyn Fn() -> Box<dyn StepController> + Send + Sync>;

/// Named step factories that a configuration can pick from.
#[derive(Clone, Default)]
pub struct StepCatalog {
    entries: Vec<(String, StepFactory)>,
}

impl StepCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The steps compiled into this binary.
    pub fn builtin(settings: &WizardSettings) -> Self {
        let env_output = settings.env_output.clone();
        let mut catalog = Self::new();
        catalog.register("welcome", Arc::new(|| Box::new(welcome::WelcomeStep)));
        catalog.register(
            "database",
            Arc::new(move || Box::new(database::DatabaseStep::new(env_output.clone()))),
        );
        catalog.register("finish", Arc::new(|| Box::new(finish::FinishStep)));
        catalog
    }

    /// Later registrations under the same name replace earlier ones.
    pub fn register(&mut self, name: &str, factory: StepFactory) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = factory;
        } else {
            self.entries.push((name.to_string(), factory));
        }
    }

    pub fn resolve(&self, name: &str) -> Option<StepFactory> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f.clone())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}
