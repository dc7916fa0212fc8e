use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::Phase;
use crate::errors::AppError;
use crate::models::{ChatResponse, Message};

/// Ordered conversation log plus the request flags shown alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub busy: bool,
    pub last_error: Option<String>,
}

/// Ids created by [`ConversationStore::begin_exchange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user_message_id: String,
    pub placeholder_id: String,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        Phase::from_flags(self.busy, self.last_error.is_some())
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Placeholders still pending while nothing is outstanding: their request
    /// failed or was abandoned.
    pub fn orphaned_placeholders(&self) -> impl Iterator<Item = &Message> {
        let idle = !self.busy;
        self.messages.iter().filter(move |m| idle && m.pending)
    }

    pub fn append_user_message(&mut self, content: impl Into<String>) -> String {
        let message = Message::user(content);
        let id = message.id.clone();
        self.messages.push(message);
        self.busy = true;
        self.last_error = None;
        id
    }

    /// Leaves `busy` as it is.
    pub fn append_placeholder(&mut self) -> String {
        let message = Message::placeholder();
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Fills a placeholder in place and ends the request. An id no longer in
    /// the log belongs to an earlier cycle: nothing changes and `false` is
    /// returned.
    pub fn resolve_placeholder(&mut self, id: &str, response: ChatResponse) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.content = response.answer;
        message.sources = Some(response.sources);
        message.created_at = response.timestamp;
        message.pending = false;
        self.busy = false;
        self.last_error = None;
        true
    }

    pub fn append_assistant_message(&mut self, response: ChatResponse) -> String {
        let message = Message::assistant(response);
        let id = message.id.clone();
        self.messages.push(message);
        self.busy = false;
        self.last_error = None;
        id
    }

    /// Records the failure of the request owning `placeholder_id`, unless that
    /// placeholder is gone (the log was reset and possibly reused since).
    pub fn fail_exchange(&mut self, placeholder_id: &str, error: impl Into<String>) -> bool {
        if self.message(placeholder_id).is_none() {
            return false;
        }
        self.set_error(Some(error.into()));
        true
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.last_error = error;
        self.busy = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Shared handle over a [`ConversationState`].
///
/// Every operation is applied in a single `send_modify`, so a subscriber never
/// sees half of a transition, and each call publishes exactly one change.
#[derive(Clone)]
pub struct ConversationStore {
    tx: Arc<watch::Sender<ConversationState>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConversationState::new());
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that is notified after every mutation. Drop it to unsubscribe.
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn snapshot(&self) -> ConversationState {
        self.tx.borrow().clone()
    }

    pub fn append_user_message(&self, content: impl Into<String>) -> String {
        let content = content.into();
        let mut id = String::new();
        self.tx.send_modify(|state| id = state.append_user_message(content));
        debug!("Appended user message {id}");
        id
    }

    pub fn append_placeholder(&self) -> String {
        let mut id = String::new();
        self.tx.send_modify(|state| id = state.append_placeholder());
        debug!("Appended placeholder {id}");
        id
    }

    /// Fills the placeholder `id` with `response`.
    ///
    /// A missing id changes nothing, notifies nobody and returns
    /// [`AppError::PlaceholderNotFound`].
    pub fn resolve_placeholder(&self, id: &str, response: ChatResponse) -> Result<(), AppError> {
        let found = self
            .tx
            .send_if_modified(|state| state.resolve_placeholder(id, response));
        if found {
            debug!("Resolved placeholder {id}");
            Ok(())
        } else {
            warn!("Dropping response for unknown placeholder {id}");
            Err(AppError::PlaceholderNotFound { id: id.to_string() })
        }
    }

    pub fn append_assistant_message(&self, response: ChatResponse) -> String {
        let mut id = String::new();
        self.tx
            .send_modify(|state| id = state.append_assistant_message(response));
        debug!("Appended assistant message {id}");
        id
    }

    pub fn set_busy(&self, busy: bool) {
        self.tx.send_modify(|state| state.set_busy(busy));
    }

    pub fn set_error(&self, error: Option<String>) {
        if let Some(message) = &error {
            debug!("Conversation request failed: {message}");
        }
        self.tx.send_modify(|state| state.set_error(error));
    }

    /// Stale failures (placeholder no longer in the log) are dropped.
    pub fn fail_exchange(&self, placeholder_id: &str, error: impl Into<String>) -> bool {
        let error = error.into();
        let recorded = self
            .tx
            .send_if_modified(|state| state.fail_exchange(placeholder_id, error));
        if !recorded {
            warn!("Dropping failure for unknown placeholder {placeholder_id}");
        }
        recorded
    }

    pub fn reset(&self) {
        self.tx.send_modify(ConversationState::reset);
        debug!("Conversation reset");
    }

    /// Starts a question/answer cycle: appends the user message and its
    /// placeholder in one transition. Refused while another request is
    /// outstanding, in which case nothing changes and nobody is notified.
    pub fn begin_exchange(&self, question: impl Into<String>) -> Result<Exchange, AppError> {
        let question = question.into();
        let mut exchange = None;
        self.tx.send_if_modified(|state| {
            if state.busy {
                return false;
            }
            let user_message_id = state.append_user_message(question);
            let placeholder_id = state.append_placeholder();
            exchange = Some(Exchange { user_message_id, placeholder_id });
            true
        });
        match exchange {
            Some(exchange) => {
                debug!("Started exchange with placeholder {}", exchange.placeholder_id);
                Ok(exchange)
            }
            None => {
                warn!("Rejected question while another request is in flight");
                Err(AppError::RequestInFlight)
            }
        }
    }
}
