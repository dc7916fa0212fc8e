use std::sync::Arc;

use tracing::{error, info};

use crate::api::Gateway;
use crate::errors::AppError;
use crate::models::Message;
use crate::state::ConversationStore;

/// Drives question/answer cycles against the gateway and records them in the
/// conversation store.
#[derive(Clone)]
pub struct ChatService {
    gateway: Arc<dyn Gateway>,
    store: ConversationStore,
}

impl ChatService {
    pub fn new(gateway: Arc<dyn Gateway>, store: ConversationStore) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Asks `question` and returns the resolved assistant message.
    ///
    /// The user message and a pending placeholder are visible to subscribers
    /// before the gateway is called. On failure the error is recorded in the
    /// store and the placeholder is left orphaned. Answers and failures that
    /// arrive after [`clear`](Self::clear) leave the store alone. A question asked while
    /// another is outstanding is refused without touching the log.
    pub async fn ask(&self, question: &str) -> Result<Message, AppError> {
        let exchange = self.store.begin_exchange(question)?;

        match self.gateway.ask(question).await {
            Ok(response) => {
                self.store
                    .resolve_placeholder(&exchange.placeholder_id, response)?;
                let state = self.store.snapshot();
                let answer = state
                    .message(&exchange.placeholder_id)
                    .cloned()
                    .ok_or(AppError::PlaceholderNotFound { id: exchange.placeholder_id })?;
                info!(
                    "Answer received ({} chars, {} sources)",
                    answer.content.len(),
                    answer.sources.as_ref().map_or(0, Vec::len)
                );
                Ok(answer)
            }
            Err(e) => {
                error!("Question failed: {e}");
                self.store.fail_exchange(&exchange.placeholder_id, e.to_string());
                Err(e)
            }
        }
    }

    /// Starts a fresh conversation.
    pub fn clear(&self) {
        self.store.reset();
    }
}
