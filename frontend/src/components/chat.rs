use leptos::prelude::*;
use leptos::{ev, html};
use org_memory::{ConfidenceLevel, Message};

use crate::state::AppState;

const EXAMPLE_QUESTIONS: [&str; 3] = [
    "What’s our refund policy?",
    "Summarize the uploaded document",
    "Explain the key points",
];

/// Main chat area with message history, typing indicator, and input.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();
    let container = NodeRef::<html::Div>::new();

    // Keep the newest turn (or the typing indicator) in view.
    Effect::new(move |_| {
        state.messages.track();
        state.awaiting.track();
        if let Some(el) = container.get() {
            request_animation_frame(move || el.set_scroll_top(el.scroll_height()));
        }
    });

    view! {
        <main class="chat-area">
            // Error banner (document operations)
            {move || {
                state.banner.get().map(|err| {
                    view! {
                        <div class="error-banner">
                            <span>"⚠ " {err}</span>
                            <button on:click=move |_| state.set_banner.set(None)>"Dismiss"</button>
                        </div>
                    }
                })
            }}

            // Messages
            <div class="messages-container" node_ref=container>
                {move || {
                    if state.messages.get().is_empty() && !state.awaiting.get() {
                        view! { <EmptyState /> }.into_any()
                    } else {
                        view! {
                            // Append-only transcript: the index is a stable key.
                            <For
                                each=move || state.messages.get().into_iter().enumerate()
                                key=|(i, _)| *i
                                children=move |(_, msg): (usize, Message)| {
                                    view! { <MessageBubble message=msg /> }
                                }
                            />
                            <Show when=move || state.awaiting.get()>
                                <TypingIndicator />
                            </Show>
                        }.into_any()
                    }
                }}
            </div>

            <ChatInput />
        </main>
    }
}

#[component]
fn EmptyState() -> impl IntoView {
    view! {
        <div class="empty-state">
            <h3>"Your organizational knowledge, powered by AI"</h3>
            <p>"Try asking:"</p>
            <ul>
                {EXAMPLE_QUESTIONS.iter().map(|q| view! { <li>{*q}</li> }).collect_view()}
            </ul>
        </div>
    }
}

#[component]
fn TypingIndicator() -> impl IntoView {
    view! {
        <div class="message assistant typing">
            <div class="role-label">"assistant"</div>
            <div>"Assistant is typing" <span class="dots">"..."</span></div>
        </div>
    }
}

/// A single chat message bubble, with the "why this answer" details for
/// successful assistant turns.
#[component]
fn MessageBubble(message: Message) -> impl IntoView {
    let css_class = if message.is_user() {
        "message user"
    } else {
        "message assistant"
    };

    let details = (!message.is_user() && !message.is_error()).then(|| {
        let confidence = message.confidence.clone().map(|label| {
            let class = format!("confidence {}", ConfidenceLevel::parse(&label).css_class());
            view! {
                <p>
                    <strong>"Confidence: "</strong>
                    <span class=class>{label}</span>
                </p>
            }
        });
        let sources = message.source_labels();
        let sources = (!sources.is_empty()).then(|| {
            view! {
                <p>
                    <strong>"Sources: "</strong>
                    {sources.join(", ")}
                </p>
            }
        });
        view! {
            <details class="why">
                <summary>"Why this answer?"</summary>
                <div class="explain-box">{confidence} {sources}</div>
            </details>
        }
    });

    let error = message.error.clone().map(|err| {
        view! { <div class="message-error">"Error: " {err}</div> }
    });

    view! {
        <div class=css_class>
            <div class="role-label">{message.role.as_str()}</div>
            <div class="content">{message.content.clone()}</div>
            {details}
            {error}
        </div>
    }
}

/// Chat input form with textarea and ask button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let is_sending = move || state.awaiting.get();

    let send = move || {
        let text = input.get_untracked();
        // Keep the draft; the store would drop it anyway.
        if text.trim().is_empty() || state.awaiting.get_untracked() {
            return;
        }
        set_input.set(String::new());
        state.ask(text);
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="2"
                    placeholder="Ask questions about your documents, policies, or knowledge base…"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || is_sending() || input.get().trim().is_empty()
                >
                    {move || if is_sending() { "Thinking…" } else { "Ask" }}
                </button>
            </div>
            <div class="disclaimer">"AI can make mistakes. Please check important information."</div>
        </div>
    }
}
