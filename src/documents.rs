use tracing::{error, info};

use crate::backend::Backend;
use crate::errors::ApiError;
use crate::models::{DocumentRecord, DocumentRef};

/// Client-side copy of the backend's document listing.
///
/// The backend is authoritative: [`DocumentLibrary::replace`] discards
/// whatever was here. Order is whatever the backend returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentLibrary {
    documents: Vec<DocumentRef>,
}

impl DocumentLibrary {
    pub fn new(documents: Vec<DocumentRef>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[DocumentRef] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, document: &DocumentRef) -> bool {
        self.documents.contains(document)
    }

    pub fn replace(&mut self, documents: Vec<DocumentRef>) {
        self.documents = documents;
    }

    /// Drops every entry equal to `document`. Returns whether anything went.
    pub fn forget(&mut self, document: &DocumentRef) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d != document);
        self.documents.len() != before
    }

    /// Adds the uploaded document unless it is already listed.
    pub fn record_upload(&mut self, record: &DocumentRecord) {
        let document = record.document();
        if !self.contains(&document) {
            self.documents.push(document);
        }
    }
}

/// Fetches the listing and replaces the local copy with it.
pub async fn refresh<B: Backend>(
    backend: &B,
    library: &mut DocumentLibrary,
) -> Result<(), ApiError> {
    let documents = backend.list_documents().await.inspect_err(|e| {
        error!("Failed to fetch documents: {e}");
    })?;
    info!("Fetched {} documents", documents.len());
    library.replace(documents);
    Ok(())
}

/// A change to a [`DocumentLibrary`], applied by whoever owns it.
pub type LibraryEdit = Box<dyn FnOnce(&mut DocumentLibrary)>;

/// Deletes `document` on the backend, then locally. The backend call is made
/// even when the document is not in the local list.
pub async fn delete<B: Backend>(
    backend: &B,
    library: &mut DocumentLibrary,
    document: &DocumentRef,
) -> Result<(), ApiError> {
    delete_with(backend, document, |edit| edit(library)).await
}

/// Like [`delete`], for a library held behind a cell or signal: on success
/// `apply` receives the edit that removes `document`.
pub async fn delete_with<B: Backend>(
    backend: &B,
    document: &DocumentRef,
    apply: impl FnOnce(LibraryEdit),
) -> Result<(), ApiError> {
    backend.delete_document(document).await.inspect_err(|e| {
        error!("Failed to delete document {document}: {e}");
    })?;
    let document = document.clone();
    apply(Box::new(move |library| {
        if !library.forget(&document) {
            info!("Deleted {document}, which was not listed locally");
        }
    }));
    Ok(())
}

/// Checks the admin key, uploads, and lists the new document locally.
pub async fn upload<B: Backend>(
    backend: &B,
    library: &mut DocumentLibrary,
    file: B::Upload,
    admin_key: &str,
) -> Result<DocumentRecord, ApiError> {
    upload_with(backend, file, admin_key, |edit| edit(library)).await
}

/// Like [`upload`], handing the listing edit to `apply`. Nothing is sent
/// without an admin key.
pub async fn upload_with<B: Backend>(
    backend: &B,
    file: B::Upload,
    admin_key: &str,
    apply: impl FnOnce(LibraryEdit),
) -> Result<DocumentRecord, ApiError> {
    let admin_key = require_admin_key(admin_key)?;
    let record = backend
        .upload_document(file, Some(admin_key))
        .await
        .inspect_err(|e| error!("Upload failed: {e}"))?;
    info!(
        "Uploaded {} ({} chunks indexed)",
        record.filename, record.chunks_indexed
    );
    let uploaded = record.clone();
    apply(Box::new(move |library| library.record_upload(&uploaded)));
    Ok(record)
}

/// Uploads are refused client-side without an admin key.
pub fn require_admin_key(admin_key: &str) -> Result<&str, ApiError> {
    let key = admin_key.trim();
    if key.is_empty() {
        return Err(ApiError::EmptyField {
            field_name: "Admin key".to_string(),
        });
    }
    Ok(key)
}
