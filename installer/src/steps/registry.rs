// Controller registry
//
// Resolves the configured step names against a catalog, orders them by priority
// (stable, so ties keep configuration order), and hands out fresh controller instances.

use log::{debug, info};

use crate::error::WizardError;

use super::{StepCatalog, StepController, StepFactory};

/// Hard cap on the number of steps a wizard may declare.
pub const MAX_STEPS: usize = 20;

struct RegistryEntry {
    name: String,
    priority: i32,
    factory: StepFactory,
}

pub struct ControllerRegistry {
    entries: Vec<RegistryEntry>,
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (&e.name, e.priority)))
            .finish()
    }
}

impl ControllerRegistry {
    /// Build the registry from configured step names.
    pub fn from_names(
        names: &[String],
        catalog: &StepCatalog,
        cap: usize,
    ) -> Result<Self, WizardError> {
        if names.len() > cap {
            return Err(WizardError::configuration(format!(
                "too many installation steps configured ({} > {})",
                names.len(),
                cap
            )));
        }

        let mut factories = Vec::with_capacity(names.len());
        for name in names {
            let factory = catalog.resolve(name).ok_or_else(|| {
                WizardError::configuration(format!(
                    "installation step '{}' cannot be resolved (known: {})",
                    name,
                    catalog.names().join(", ")
                ))
            })?;
            factories.push((name.clone(), factory));
        }

        Self::from_factories(factories, cap)
    }

    /// Build the registry from explicit factories, in discovery order.
    pub fn from_factories(
        factories: Vec<(String, StepFactory)>,
        cap: usize,
    ) -> Result<Self, WizardError> {
        if factories.is_empty() {
            return Err(WizardError::configuration("no installation steps found"));
        }
        if factories.len() > cap {
            return Err(WizardError::configuration(format!(
                "too many installation steps ({} > {})",
                factories.len(),
                cap
            )));
        }

        let mut entries: Vec<RegistryEntry> = factories
            .into_iter()
            .map(|(name, factory)| {
                let priority = factory().priority();
                RegistryEntry {
                    name,
                    priority,
                    factory,
                }
            })
            .collect();
        entries.sort_by_key(|e| e.priority);

        info!(
            "[PHASE: initialization] [STEP: registry] Step order: {}",
            entries
                .iter()
                .map(|e| format!("{}({})", e.name, e.priority))
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Fresh controller for a 1-based step number.
    pub fn instantiate(&self, step: usize) -> Option<Box<dyn StepController>> {
        let entry = self.entries.get(step.checked_sub(1)?)?;
        debug!("Instantiating step controller '{}'", entry.name);
        Some((entry.factory)())
    }

    /// Fresh controllers for every step, in priority order.
    pub fn list(&self) -> Vec<Box<dyn StepController>> {
        self.entries.iter().map(|e| (e.factory)()).collect()
    }

    /// Invoke `reset` on every controller; the first failure aborts the fan-out.
    pub fn reset_all(&self) -> Result<(), WizardError> {
        for controller in self.list() {
            controller.reset().map_err(|source| WizardError::Controller {
                step: controller.id().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}
