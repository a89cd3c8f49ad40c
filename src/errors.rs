use serde::de::IgnoredAny;
use serde::Deserialize;
use thiserror::Error;

/// Shown for failures the user can do nothing about except try again.
pub const GENERIC_RETRY_MESSAGE: &str = "Something went wrong. Please try again.";

/// The backend call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    ListDocuments,
    DeleteDocument,
    Ask,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::ListDocuments => "list documents",
            Operation::DeleteDocument => "delete document",
            Operation::Ask => "ask",
        }
    }

    /// Message used when the server gives no usable detail.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::Upload => "Upload failed",
            Operation::ListDocuments => "Failed to fetch documents",
            Operation::DeleteDocument => "Delete failed",
            Operation::Ask => "Ask failed",
        }
    }

    /// Listing and deleting report a generic message whatever the server says.
    fn surfaces_detail(&self) -> bool {
        matches!(self, Operation::Upload | Operation::Ask)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured rejection reason sent by the backend as `error_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    NoDocuments,
    EmptyQuestion,
    Unauthorized,
    AskFailed,
    Unknown(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::NoDocuments => "NO_DOCUMENTS",
            ErrorCode::EmptyQuestion => "EMPTY_QUESTION",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::AskFailed => "ASK_FAILED",
            ErrorCode::Unknown(code) => code,
        }
    }

    /// Copy for codes the UI knows how to explain. `None` for everything else.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            ErrorCode::NoDocuments => {
                Some("Please upload at least one document before asking questions.")
            }
            ErrorCode::EmptyQuestion => Some("Please type a question first."),
            ErrorCode::Unauthorized => Some("Invalid or missing admin key."),
            ErrorCode::AskFailed | ErrorCode::Unknown(_) => None,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "NO_DOCUMENTS" => ErrorCode::NoDocuments,
            "EMPTY_QUESTION" => ErrorCode::EmptyQuestion,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "ASK_FAILED" => ErrorCode::AskFailed,
            other => ErrorCode::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure the backend client or the stores can report.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    // ── Transport ────────────────────────────────────────────────────────────
    #[error("Network error during {operation}: {message}")]
    Network { operation: Operation, message: String },

    // ── Server ───────────────────────────────────────────────────────────────
    #[error("{message}")]
    Rejected {
        operation: Operation,
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },

    #[error("Unexpected response to {operation}: {message}")]
    Malformed { operation: Operation, message: String },

    // ── Client-side validation ───────────────────────────────────────────────
    #[error("{field_name} is required")]
    EmptyField { field_name: String },

    // ── Abandoned requests ───────────────────────────────────────────────────
    #[error("Request interrupted during {operation}: {message}")]
    Interrupted { operation: Operation, message: String },
}

impl ApiError {
    pub fn network(operation: Operation, message: impl Into<String>) -> Self {
        ApiError::Network { operation, message: message.into() }
    }

    pub fn malformed(operation: Operation, message: impl Into<String>) -> Self {
        ApiError::Malformed { operation, message: message.into() }
    }

    pub fn interrupted(operation: Operation, message: impl Into<String>) -> Self {
        ApiError::Interrupted { operation, message: message.into() }
    }

    /// Builds the rejection for a non-2xx response from its raw body.
    ///
    /// The body may be `{"detail": "text"}`, `{"detail": {"error_code", "message"}}`
    /// or a top-level `{"error_code", "message"}`. Anything else, including an
    /// empty or non-JSON body, falls back to the operation's generic message.
    pub fn rejected(operation: Operation, status: u16, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
        let (code, detail) = parsed.map(ErrorBody::into_parts).unwrap_or((None, None));

        let message = match detail {
            Some(detail) if operation.surfaces_detail() && !detail.trim().is_empty() => detail,
            _ => operation.fallback_message().to_string(),
        };

        ApiError::Rejected {
            operation,
            status,
            code: code.as_deref().map(ErrorCode::from),
            message,
        }
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            ApiError::Rejected { code, .. } => code.as_ref(),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ApiError::Network { operation, .. }
            | ApiError::Rejected { operation, .. }
            | ApiError::Malformed { operation, .. }
            | ApiError::Interrupted { operation, .. } => Some(*operation),
            ApiError::EmptyField { .. } => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::EmptyField { .. })
    }

    /// Text to put in front of the user: a banner for document operations,
    /// the `error` field of an assistant turn for questions.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { code: Some(code), .. } => code
                .user_message()
                .unwrap_or(GENERIC_RETRY_MESSAGE)
                .to_string(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::EmptyField { .. } => self.to_string(),
            ApiError::Network { .. } | ApiError::Malformed { .. } | ApiError::Interrupted { .. } => {
                GENERIC_RETRY_MESSAGE.to_string()
            }
        }
    }
}

// ── Error body decoding ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Detail>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Structured {
        #[serde(default)]
        error_code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    // e.g. a list of field validation errors
    Other(IgnoredAny),
}

impl ErrorBody {
    fn into_parts(self) -> (Option<String>, Option<String>) {
        match self.detail {
            Some(Detail::Text(text)) => (self.error_code, Some(text)),
            Some(Detail::Structured { error_code, message }) => (
                error_code.or(self.error_code),
                message.or(self.message),
            ),
            Some(Detail::Other(_)) | None => (self.error_code, self.message),
        }
    }
}
