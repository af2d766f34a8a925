//! External collaborators the core calls through narrow interfaces

mod artifacts;
mod notifier;
mod renderer;

pub use artifacts::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
pub use notifier::{HttpDispatcher, Notification, NotificationDispatcher, RecordingDispatcher};
pub use renderer::{
    DocumentRenderer, EvaluationDocument, JsonDocumentRenderer, QuestionnaireDocument,
};
