use leptos::html;
use leptos::prelude::*;
use org_memory::DocumentRef;

use crate::state::{AppState, UploadStatus};

/// Sidebar with the upload form and the document list.
#[component]
pub fn Sidebar() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"📁 Documents"</h2>
                <button class="refresh-btn" on:click=move |_| state.load_documents()>
                    "Refresh"
                </button>
            </div>
            <UploadForm />
            <DocumentList />
        </aside>
    }
}

#[component]
fn UploadForm() -> impl IntoView {
    let state = expect_context::<AppState>();
    let file_input = NodeRef::<html::Input>::new();
    let (admin_key, set_admin_key) = signal(String::new());

    let uploading = move || state.upload_status.get() == UploadStatus::Uploading;

    let on_upload = move |_| {
        let Some(input) = file_input.get() else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            state
                .set_upload_status
                .set(UploadStatus::Failed("Choose a file first".to_string()));
            return;
        };
        state.upload_document(file, admin_key.get_untracked());
        // reset input
        input.set_value("");
    };

    view! {
        <div class="upload-box">
            <input type="file" accept=".pdf,.txt,.md" node_ref=file_input />
            <label class="admin-key">
                "Admin key"
                <input
                    type="password"
                    placeholder="Enter admin key"
                    prop:value=admin_key
                    on:input=move |ev| set_admin_key.set(event_target_value(&ev))
                />
            </label>
            <button class="upload-btn" on:click=on_upload disabled=uploading>
                {move || if uploading() { "Uploading…" } else { "+ Upload document" }}
            </button>
            {move || match state.upload_status.get() {
                UploadStatus::Done(msg) => Some(view! { <p class="upload-success">{msg}</p> }.into_any()),
                UploadStatus::Failed(msg) => Some(view! { <p class="upload-error">{msg}</p> }.into_any()),
                UploadStatus::Idle | UploadStatus::Uploading => None,
            }}
        </div>
    }
}

#[component]
fn DocumentList() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <div class="document-list">
            {move || {
                if state.documents_loading.get() {
                    return view! { <p class="muted">"Loading documents…"</p> }.into_any();
                }
                if state.documents.get().is_empty() {
                    return view! { <p class="muted">"No documents uploaded"</p> }.into_any();
                }
                view! {
                    <ul>
                        <For
                            each=move || state.documents.get().documents().to_vec()
                            key=|doc| doc.clone()
                            children=move |doc: DocumentRef| view! { <DocumentItem document=doc /> }
                        />
                    </ul>
                }.into_any()
            }}
        </div>
    }
}

#[component]
fn DocumentItem(document: DocumentRef) -> impl IntoView {
    let state = expect_context::<AppState>();
    let label = document.to_string();

    let on_delete = move |_| {
        let confirmed = web_sys::window()
            .and_then(|w| w.confirm_with_message(&format!("Delete {document}?")).ok())
            .unwrap_or(false);
        if confirmed {
            state.delete_document(document.clone());
        }
    };

    view! {
        <li class="document-item">
            <span>{label}</span>
            <button class="delete-btn" title="Delete" on:click=on_delete>"✕"</button>
        </li>
    }
}
