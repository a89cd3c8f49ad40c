use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Content of an assistant turn that failed; the reason goes in `error`.
pub const FAILED_REPLY: &str = "Sorry, I encountered an error while processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the transcript. Built only by the conversation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Message {
    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            confidence: None,
            sources: None,
            error: None,
        }
    }

    pub(crate) fn answer(result: AskResult) -> Self {
        Self {
            role: Role::Assistant,
            content: result.answer,
            confidence: Some(result.confidence),
            sources: Some(result.sources_used),
            error: None,
        }
    }

    pub(crate) fn failure(err: &ApiError) -> Self {
        Self {
            role: Role::Assistant,
            content: FAILED_REPLY.to_string(),
            confidence: None,
            sources: None,
            error: Some(err.user_message()),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn confidence_level(&self) -> Option<ConfidenceLevel> {
        self.confidence.as_deref().map(ConfidenceLevel::parse)
    }

    /// Citation markers, e.g. `["Chunk 1", "Chunk 3"]` for sources `[0, 2]`.
    pub fn source_labels(&self) -> Vec<String> {
        self.sources
            .iter()
            .flatten()
            .map(|s| format!("Chunk {}", u64::from(*s) + 1))
            .collect()
    }
}

/// Display emphasis for the backend's free-form confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl ConfidenceLevel {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => ConfidenceLevel::High,
            "medium" | "medium-high" => ConfidenceLevel::Medium,
            "low" => ConfidenceLevel::Low,
            _ => ConfidenceLevel::Unknown,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "confidence-high",
            ConfidenceLevel::Medium => "confidence-medium",
            ConfidenceLevel::Low | ConfidenceLevel::Unknown => "confidence-low",
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

/// Request body for `POST /ask/`.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

/// Response from `POST /ask/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AskResult {
    pub answer: String,
    pub confidence: String,
    #[serde(default)]
    pub sources_used: Vec<u32>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Server-side name of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DocumentRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The listing has shipped both as bare names and as `{"filename": ..}`.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Listed {
            Name(String),
            Entry { filename: String },
        }

        Ok(match Listed::deserialize(deserializer)? {
            Listed::Name(name) | Listed::Entry { filename: name } => DocumentRef(name),
        })
    }
}

/// Response from `POST /documents/upload`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,
    #[serde(default)]
    pub chunks_indexed: usize,
}

impl DocumentRecord {
    pub fn document(&self) -> DocumentRef {
        DocumentRef::new(self.filename.clone())
    }
}
