pub mod feedback;
pub mod field;
pub mod state;

pub use feedback::{Feedback, FeedbackKind};
pub use field::{FieldDescriptor, FieldKind, FieldValue, FieldValues};
pub use state::SessionState;
