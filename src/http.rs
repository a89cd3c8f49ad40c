use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{Backend, Endpoints, ADMIN_KEY_HEADER};
use crate::config::ClientConfig;
use crate::errors::{ApiError, Operation};
use crate::models::{AskRequest, AskResult, DocumentRecord, DocumentRef};

/// A file read into memory for a multipart upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }

    /// Reads `path`, naming the upload after its last component.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// [`Backend`] over `reqwest`. Uses the transport's default timeouts.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            endpoints: Endpoints::new(&config.api_base_url),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

impl Backend for HttpBackend {
    type Upload = FileUpload;

    async fn upload_document(
        &self,
        file: FileUpload,
        admin_key: Option<&str>,
    ) -> Result<DocumentRecord, ApiError> {
        let op = Operation::Upload;
        let form = Form::new().part("file", Part::bytes(file.bytes).file_name(file.file_name));

        let mut request = self.client.post(self.endpoints.upload()).multipart(form);
        if let Some(key) = admin_key {
            request = request.header(ADMIN_KEY_HEADER, key);
        }

        let resp = request.send().await.map_err(|e| network(op, e))?;
        decode(op, resp).await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>, ApiError> {
        let op = Operation::ListDocuments;
        let resp = self
            .client
            .get(self.endpoints.documents())
            .send()
            .await
            .map_err(|e| network(op, e))?;
        decode(op, resp).await
    }

    async fn delete_document(&self, document: &DocumentRef) -> Result<(), ApiError> {
        let op = Operation::DeleteDocument;
        let resp = self
            .client
            .delete(self.endpoints.document(document))
            .send()
            .await
            .map_err(|e| network(op, e))?;

        // Success bodies vary (empty, `{"deleted": ..}`); none of them matter.
        ensure_success(op, resp).await.map(drop)
    }

    async fn ask_question(&self, question: &str) -> Result<AskResult, ApiError> {
        let op = Operation::Ask;
        let resp = self
            .client
            .post(self.endpoints.ask())
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(|e| network(op, e))?;
        decode(op, resp).await
    }
}

fn network(op: Operation, err: reqwest::Error) -> ApiError {
    ApiError::network(op, err.to_string())
}

/// Passes 2xx responses through; turns anything else into a rejection.
async fn ensure_success(op: Operation, resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    debug!("{op} -> {status}");
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.map_err(|e| network(op, e))?;
    Err(ApiError::rejected(op, status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(op: Operation, resp: Response) -> Result<T, ApiError> {
    let resp = ensure_success(op, resp).await?;
    let body = resp.bytes().await.map_err(|e| network(op, e))?;
    serde_json::from_slice(&body).map_err(|e| ApiError::malformed(op, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::conversation::{AskOutcome, ConversationStore};
    use crate::errors::ErrorCode;
    use crate::models::{Message, Role};

    async fn backend_for(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&ClientConfig::new(&server.uri()))
    }

    #[tokio::test]
    async fn ask_posts_question_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask/"))
            .and(body_json(json!({"question": "What is the refund policy?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "30 days",
                "confidence": "Medium",
                "sources_used": [1],
                "model": "gpt-4o-mini"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = backend_for(&server)
            .await
            .ask_question("What is the refund policy?")
            .await
            .unwrap();

        assert_eq!(result.answer, "30 days");
        assert_eq!(result.sources_used, vec![1]);
        assert_eq!(result.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[tokio::test]
    async fn ask_surfaces_structured_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": {"error_code": "NO_DOCUMENTS", "message": "No documents indexed yet"}
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server).await.ask_question("hi").await.unwrap_err();

        assert!(err.is_rejection());
        assert_eq!(err.code(), Some(&ErrorCode::NoDocuments));
        assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn ask_with_garbage_success_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = backend_for(&server).await.ask_question("hi").await.unwrap_err();

        assert!(matches!(err, ApiError::Malformed { operation: Operation::Ask, .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Nothing listens on the discard port.
        let backend = HttpBackend::new(&ClientConfig::new("http://127.0.0.1:9"));

        let err = backend.list_documents().await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(err.operation(), Some(Operation::ListDocuments));
    }

    #[tokio::test]
    async fn upload_sends_file_and_admin_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/documents/upload"))
            .and(header("X-Admin-Key", "s3cret"))
            .and(body_string_contains("name=\"file\"; filename=\"handbook.pdf\""))
            .and(body_string_contains("%PDF-1.4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "filename": "handbook.pdf",
                "chunks_indexed": 12
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = FileUpload::new("handbook.pdf", b"%PDF-1.4 fake".to_vec());
        let record = backend_for(&server)
            .await
            .upload_document(file, Some("s3cret"))
            .await
            .unwrap();

        assert_eq!(record, DocumentRecord { filename: "handbook.pdf".to_string(), chunks_indexed: 12 });
    }

    #[tokio::test]
    async fn upload_rejection_uses_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/documents/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": {"error_code": "UNAUTHORIZED", "message": "Invalid or missing admin key"}
            })))
            .mount(&server)
            .await;

        let file = FileUpload::new("a.pdf", vec![1, 2, 3]);
        let err = backend_for(&server)
            .await
            .upload_document(file, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid or missing admin key");
        assert_eq!(err.code(), Some(&ErrorCode::Unauthorized));
    }

    #[tokio::test]
    async fn list_decodes_filename_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"filename": "handbook.pdf"},
                {"filename": "policies.pdf"}
            ])))
            .mount(&server)
            .await;

        let docs = backend_for(&server).await.list_documents().await.unwrap();

        assert_eq!(docs, vec![DocumentRef::new("handbook.pdf"), DocumentRef::new("policies.pdf")]);
    }

    #[tokio::test]
    async fn list_failure_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "disk on fire"})))
            .mount(&server)
            .await;

        let err = backend_for(&server).await.list_documents().await.unwrap_err();

        assert_eq!(err.user_message(), "Failed to fetch documents");
    }

    #[tokio::test]
    async fn delete_ignores_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/documents/old%20notes.pdf"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server)
            .await
            .delete_document(&DocumentRef::new("old notes.pdf"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_not_found_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/documents/missing.pdf"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "File not found"})))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .await
            .delete_document(&DocumentRef::new("missing.pdf"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Delete failed");
        assert!(matches!(err, ApiError::Rejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn conversation_over_http_records_transcript() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask/"))
            .and(body_json(json!({"question": "What is the refund policy?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "30 days",
                "confidence": "Medium",
                "sources_used": [1]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ask/"))
            .and(body_json(json!({"question": "x"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "no documents"})))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let store = ConversationStore::new();

        store.ask(&backend, "What is the refund policy?").await;
        let outcome = store.ask(&backend, "x").await;

        let transcript = serde_json::to_value(store.messages()).unwrap();
        assert_eq!(
            transcript,
            json!([
                {"role": "user", "content": "What is the refund policy?"},
                {"role": "assistant", "content": "30 days", "confidence": "Medium", "sources": [1]},
                {"role": "user", "content": "x"},
                {
                    "role": "assistant",
                    "content": crate::models::FAILED_REPLY,
                    "error": "no documents"
                }
            ])
        );
        assert!(matches!(
            outcome,
            AskOutcome::Replied(Message { role: Role::Assistant, error: Some(_), .. })
        ));
        assert!(!store.is_awaiting());
    }
}
