use gloo_net::http::{Request, Response};
use org_memory::backend::{ADMIN_KEY_HEADER, Backend, Endpoints};
use org_memory::config::{ClientConfig, DEFAULT_API_BASE_URL};
use org_memory::models::AskRequest;
use org_memory::{ApiError, AskResult, DocumentRecord, DocumentRef, Operation};
use serde::de::DeserializeOwned;
use web_sys::{File, FormData};

/// Backend base URL, fixed at build time (`ORG_MEMORY_API_URL=... trunk build`).
pub fn config() -> ClientConfig {
    ClientConfig::new(option_env!("ORG_MEMORY_API_URL").unwrap_or(DEFAULT_API_BASE_URL))
}

/// [`Backend`] over the browser's `fetch`.
#[derive(Clone, Debug)]
pub struct GlooBackend {
    endpoints: Endpoints,
}

impl GlooBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            endpoints: Endpoints::new(&config.api_base_url),
        }
    }
}

impl Backend for GlooBackend {
    type Upload = File;

    async fn upload_document(
        &self,
        file: File,
        admin_key: Option<&str>,
    ) -> Result<DocumentRecord, ApiError> {
        let op = Operation::Upload;
        let form = FormData::new().map_err(|e| ApiError::network(op, format!("{e:?}")))?;
        form.append_with_blob_and_filename("file", &file, &file.name())
            .map_err(|e| ApiError::network(op, format!("{e:?}")))?;

        let mut builder = Request::post(&self.endpoints.upload());
        if let Some(key) = admin_key {
            builder = builder.header(ADMIN_KEY_HEADER, key);
        }
        let resp = builder
            .body(form)
            .map_err(|e| ApiError::network(op, e.to_string()))?
            .send()
            .await
            .map_err(|e| ApiError::network(op, e.to_string()))?;

        decode(op, resp).await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>, ApiError> {
        let op = Operation::ListDocuments;
        let resp = Request::get(&self.endpoints.documents())
            .send()
            .await
            .map_err(|e| ApiError::network(op, e.to_string()))?;

        decode(op, resp).await
    }

    async fn delete_document(&self, document: &DocumentRef) -> Result<(), ApiError> {
        let op = Operation::DeleteDocument;
        let resp = Request::delete(&self.endpoints.document(document))
            .send()
            .await
            .map_err(|e| ApiError::network(op, e.to_string()))?;

        // backend returns no content, don't parse it
        ensure_success(op, resp).await.map(drop)
    }

    async fn ask_question(&self, question: &str) -> Result<AskResult, ApiError> {
        let op = Operation::Ask;
        let resp = Request::post(&self.endpoints.ask())
            .json(&AskRequest { question })
            .map_err(|e| ApiError::malformed(op, format!("Serialize error: {e}")))?
            .send()
            .await
            .map_err(|e| ApiError::network(op, e.to_string()))?;

        decode(op, resp).await
    }
}

async fn ensure_success(op: Operation, resp: Response) -> Result<Response, ApiError> {
    if resp.ok() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.binary().await.unwrap_or_default();
    log::warn!("{op} failed with HTTP {status}");
    Err(ApiError::rejected(op, status, &body))
}

async fn decode<T: DeserializeOwned>(op: Operation, resp: Response) -> Result<T, ApiError> {
    ensure_success(op, resp)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::malformed(op, format!("Parse error: {e}")))
}
