//! Services module
//!
//! Business logic that coordinates uploads, the note repository and the
//! attachment store.

pub mod attachments;
pub mod content_type;
pub mod notes;

pub use attachments::AttachmentsService;
pub use notes::{EditStage, NotesService};
