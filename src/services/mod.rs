//! Request-level operations shared by the HTTP handlers.

pub mod chat;
pub mod documents;

pub use chat::{ChatQuery, ChatReply, ChatService};
pub use documents::{DeleteOutcome, DocumentService, UploadReceipt};
