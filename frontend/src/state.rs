use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use org_memory::documents;
use org_memory::{AskOutcome, ConversationStore, DocumentLibrary, DocumentRef, Message};
use web_sys::File;

use crate::api::{self, GlooBackend};

/// How long an upload success notice stays up.
const UPLOAD_NOTICE_MS: u32 = 1_500;

#[derive(Clone, Debug, PartialEq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Done(String),
    Failed(String),
}

/// Shared application state, provided via Leptos context.
///
/// The transcript is owned by a [`ConversationStore`]; the `messages` and
/// `awaiting` signals only mirror it so views can subscribe.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub messages: ReadSignal<Vec<Message>>,
    pub awaiting: ReadSignal<bool>,
    pub documents: ReadSignal<DocumentLibrary>,
    pub documents_loading: ReadSignal<bool>,
    pub banner: ReadSignal<Option<String>>,
    pub upload_status: ReadSignal<UploadStatus>,

    // --- Write signals (for mutating state) ---
    pub set_documents: WriteSignal<DocumentLibrary>,
    pub set_documents_loading: WriteSignal<bool>,
    pub set_banner: WriteSignal<Option<String>>,
    pub set_upload_status: WriteSignal<UploadStatus>,

    store: StoredValue<ConversationStore, LocalStorage>,
    backend: StoredValue<GlooBackend>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (messages, set_messages) = signal(Vec::<Message>::new());
        let (awaiting, set_awaiting) = signal(false);
        let (documents, set_documents) = signal(DocumentLibrary::default());
        let (documents_loading, set_documents_loading) = signal(true);
        let (banner, set_banner) = signal(None::<String>);
        let (upload_status, set_upload_status) = signal(UploadStatus::Idle);

        let store = ConversationStore::with_listener(move |conversation| {
            set_messages.set(conversation.messages().to_vec());
            set_awaiting.set(conversation.is_awaiting());
        });

        let config = api::config();
        log::info!("Using backend at {}", config.api_base_url);

        let state = Self {
            messages,
            awaiting,
            documents,
            documents_loading,
            banner,
            upload_status,
            set_documents,
            set_documents_loading,
            set_banner,
            set_upload_status,
            store: StoredValue::new_local(store),
            backend: StoredValue::new(GlooBackend::new(&config)),
        };

        provide_context(state);
        state
    }

    /// Ask a question. Dropped by the store if one is already in flight.
    pub fn ask(&self, question: String) {
        let store = self.store.get_value();
        let backend = self.backend.get_value();
        spawn_local(async move {
            if store.ask(&backend, &question).await == AskOutcome::Busy {
                log::warn!("Ignored question while another is awaiting an answer");
            }
        });
    }

    /// Load the document list from the backend, replacing the local one.
    pub fn load_documents(&self) {
        let state = *self;
        self.set_documents_loading.set(true);

        spawn_local(async move {
            let backend = state.backend.get_value();
            let mut library = DocumentLibrary::default();
            match documents::refresh(&backend, &mut library).await {
                Ok(()) => state.set_documents.set(library),
                Err(e) => state.set_banner.set(Some(e.user_message())),
            }
            state.set_documents_loading.set(false);
        });
    }

    pub fn delete_document(&self, document: DocumentRef) {
        let state = *self;
        self.set_banner.set(None);

        spawn_local(async move {
            let backend = state.backend.get_value();
            let deleted = documents::delete_with(&backend, &document, |edit| {
                state.set_documents.update(edit)
            })
            .await;
            if let Err(e) = deleted {
                state.set_banner.set(Some(e.user_message()));
            }
        });
    }

    pub fn upload_document(&self, file: File, admin_key: String) {
        let state = *self;
        self.set_upload_status.set(UploadStatus::Uploading);

        spawn_local(async move {
            let backend = state.backend.get_value();
            let uploaded = documents::upload_with(&backend, file, &admin_key, |edit| {
                state.set_documents.update(edit)
            })
            .await;
            match uploaded {
                Ok(record) => {
                    state.set_upload_status.set(UploadStatus::Done(format!(
                        "Uploaded {} ({} chunks indexed)",
                        record.filename, record.chunks_indexed
                    )));
                    Timeout::new(UPLOAD_NOTICE_MS, move || {
                        state.set_upload_status.update(|status| {
                            if matches!(status, UploadStatus::Done(_)) {
                                *status = UploadStatus::Idle;
                            }
                        });
                    })
                    .forget();
                }
                Err(e) => state.set_upload_status.set(UploadStatus::Failed(e.user_message())),
            }
        });
    }
}
