//! Client side of the Organizational Memory service: ask questions about
//! uploaded documents and manage the documents themselves.
//!
//! The library is transport-agnostic. [`backend::Backend`] is implemented by
//! [`http::HttpBackend`] natively and by the web front-end over `gloo-net`.

pub mod backend;
pub mod config;
pub mod conversation;
pub mod documents;
pub mod errors;
pub mod models;

#[cfg(feature = "native")]
pub mod http;

pub use backend::{Backend, Endpoints};
pub use config::ClientConfig;
pub use conversation::{AskOutcome, Conversation, ConversationStore, Phase};
pub use documents::DocumentLibrary;
pub use errors::{ApiError, ErrorCode, Operation};
pub use models::{AskResult, ConfidenceLevel, DocumentRecord, DocumentRef, Message, Role};
