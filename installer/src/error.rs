// Error taxonomy
//
// Controller feedback (bad user input) is NOT an error: it travels as `Option<Feedback>`
// and never reaches this module. Everything here is either a recoverable protocol
// violation (redirect to the canonical step) or a fatal fault surfaced to the operator.

use thiserror::Error;

/// Session store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("session blob for '{id}' is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("invalid session id '{0}'")]
    InvalidId(String),
}

/// Step-flow protocol violations. Recoverable by redirecting to the current step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("'complete' submitted on step {current} of {total}")]
    CompleteOffLastStep { current: usize, total: usize },

    #[error("no step controller at step {step} (total {total})")]
    NoControllerAtStep { step: usize, total: usize },
}

#[derive(Debug, Error)]
pub enum WizardError {
    /// Operator-facing setup error (discovery cap, unknown step name, no steps, bad fields).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("protocol violation: {violation}")]
    Protocol {
        violation: ProtocolViolation,
        current_step: usize,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A controller hook failed (as opposed to returning feedback).
    #[error("step controller '{step}' failed: {source}")]
    Controller {
        step: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WizardError {
    pub fn configuration(message: impl Into<String>) -> Self {
        WizardError::Configuration(message.into())
    }

    /// Fatal errors abort the run (non-zero exit / 5xx). Protocol violations do not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WizardError::Protocol { .. })
    }

    /// Step to redirect to when the error is recoverable.
    pub fn redirect_step(&self) -> Option<usize> {
        match self {
            WizardError::Protocol { current_step, .. } => Some(*current_step),
            _ => None,
        }
    }
}
