//! Chat transcript and the single-request state machine around it.
//!
//! A [`ConversationStore`] is `idle` or `awaiting`. [`ConversationStore::ask`]
//! is the only way to change it: a blank question or a question asked while
//! awaiting does nothing, anything else appends the user turn, calls the
//! backend, and appends exactly one assistant turn before returning to idle.

use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::backend::{preview, Backend};
use crate::errors::{ApiError, Operation};
use crate::models::Message;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Awaiting,
}

/// What happened to a call to [`ConversationStore::ask`].
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// The question was empty after trimming; nothing was sent.
    Blank,
    /// Another question is still in flight; this one was dropped.
    Busy,
    /// The assistant turn appended for this question (answer or error).
    Replied(Message),
}

/// Transcript plus the awaiting flag. Read-only outside this module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
    phase: Phase,
}

impl Conversation {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_awaiting(&self) -> bool {
        self.phase == Phase::Awaiting
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn begin(&mut self, question: &str) -> Result<(), AskOutcome> {
        if question.trim().is_empty() {
            return Err(AskOutcome::Blank);
        }
        if self.is_awaiting() {
            return Err(AskOutcome::Busy);
        }
        self.messages.push(Message::user(question));
        self.phase = Phase::Awaiting;
        Ok(())
    }

    fn settle(&mut self, result: Result<crate::models::AskResult, ApiError>) -> Message {
        let reply = match result {
            Ok(answer) => Message::answer(answer),
            Err(err) => Message::failure(&err),
        };
        self.messages.push(reply.clone());
        self.phase = Phase::Idle;
        reply
    }
}

type Listener = Rc<dyn Fn(&Conversation)>;

/// Shared handle to one conversation. Cloning shares the same transcript.
///
/// Not `Send`: everything runs on one event loop.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Rc<RefCell<Conversation>>,
    listener: Option<Listener>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `listener` runs after every change, with the new state.
    pub fn with_listener(listener: impl Fn(&Conversation) + 'static) -> Self {
        Self {
            inner: Rc::default(),
            listener: Some(Rc::new(listener)),
        }
    }

    pub fn snapshot(&self) -> Conversation {
        self.inner.borrow().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.borrow().messages.clone()
    }

    pub fn is_awaiting(&self) -> bool {
        self.inner.borrow().is_awaiting()
    }

    pub async fn ask<B: Backend>(&self, backend: &B, question: &str) -> AskOutcome {
        if let Err(outcome) = self.inner.borrow_mut().begin(question) {
            if outcome == AskOutcome::Busy {
                warn!("Question dropped, another one is still awaiting an answer");
            }
            return outcome;
        }
        self.notify();
        info!("Asking: {}", preview(question));

        let mut in_flight = InFlight { store: self, settled: false };

        let result = AssertUnwindSafe(backend.ask_question(question))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "backend panicked".to_string());
                Err(ApiError::interrupted(Operation::Ask, reason))
            });

        match &result {
            Ok(answer) => info!(
                confidence = %answer.confidence,
                sources = answer.sources_used.len(),
                model = answer.model.as_deref().unwrap_or("unknown"),
                "Answer received"
            ),
            Err(e) => error!("Ask failed: {e}"),
        }

        in_flight.settled = true;
        let reply = self.inner.borrow_mut().settle(result);
        self.notify();
        AskOutcome::Replied(reply)
    }

    fn notify(&self) {
        if let Some(listener) = &self.listener {
            let snapshot = self.snapshot();
            listener(&snapshot);
        }
    }
}

/// Settles the pending turn if the `ask` future is dropped before the
/// backend answers, so the store never stays in `awaiting`.
struct InFlight<'a> {
    store: &'a ConversationStore,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Ok(mut conversation) = self.store.inner.try_borrow_mut() else {
            return;
        };
        warn!("Question abandoned before the backend answered");
        conversation.settle(Err(ApiError::interrupted(
            Operation::Ask,
            "request abandoned",
        )));
        drop(conversation);
        self.store.notify();
    }
}
