use crate::errors::ApiError;
use crate::models::{AskResult, DocumentRecord, DocumentRef};

/// Header carrying the admin credential on uploads.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// The four calls the retrieval service exposes. Each performs exactly one
/// round trip and never retries; failures come back as [`ApiError`].
///
/// Implementations are single-threaded (the browser client is not `Send`),
/// hence plain `async fn`.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// The file handle this transport can put in a multipart body.
    type Upload;

    async fn upload_document(
        &self,
        file: Self::Upload,
        admin_key: Option<&str>,
    ) -> Result<DocumentRecord, ApiError>;

    async fn list_documents(&self) -> Result<Vec<DocumentRef>, ApiError>;

    async fn delete_document(&self, document: &DocumentRef) -> Result<(), ApiError>;

    async fn ask_question(&self, question: &str) -> Result<AskResult, ApiError>;
}

/// URL table for the backend, shared by every transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn upload(&self) -> String {
        format!("{}/documents/upload", self.base)
    }

    pub fn documents(&self) -> String {
        format!("{}/documents", self.base)
    }

    pub fn document(&self, document: &DocumentRef) -> String {
        format!(
            "{}/documents/{}",
            self.base,
            urlencoding::encode(document.as_str())
        )
    }

    pub fn ask(&self) -> String {
        format!("{}/ask/", self.base)
    }
}

/// First 100 characters of a question, for log lines.
pub(crate) fn preview(question: &str) -> String {
    const LIMIT: usize = 100;
    if question.chars().count() > LIMIT {
        format!("{}…", question.chars().take(LIMIT).collect::<String>())
    } else {
        question.to_string()
    }
}
