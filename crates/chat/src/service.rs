//! Chat orchestration: history, retrieved context, and the LLM call.

use crate::history::{HistoryStore, StoredMessage};
use lorebase_core::AppResult;
use lorebase_knowledge::DocumentStore;
use lorebase_llm::{ChatMessage, ChatRequest, LlmClient, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cap on generated reply length.
const DEFAULT_MAX_TOKENS: u32 = 512;

/// Result of one chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Session this exchange belongs to
    pub session_id: String,

    /// The assistant's reply
    pub reply: String,

    /// Full message history for the session, oldest first
    pub history: Vec<StoredMessage>,
}

/// Drives one chat turn end to end.
///
/// A turn saves the user message, rebuilds the conversation from stored
/// history, retrieves knowledge-base context for the user's message and
/// prepends it as a system turn, asks the LLM for a reply, and saves
/// that reply back into the history.
pub struct ChatService {
    history: HistoryStore,
    store: Arc<DocumentStore>,
    client: Arc<dyn LlmClient>,
    model: String,
    top_k: usize,
}

impl ChatService {
    /// Create a new chat service.
    pub fn new(
        history: HistoryStore,
        store: Arc<DocumentStore>,
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            history,
            store,
            client,
            model: model.into(),
            top_k,
        }
    }

    /// Access the underlying history store.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Run one chat exchange.
    ///
    /// A missing `session_id` starts a fresh session with a generated
    /// identifier. An empty knowledge base degrades to a plain chat: no
    /// system turn is injected and the conversation goes to the LLM
    /// unchanged.
    pub async fn reply(
        &self,
        session_id: Option<&str>,
        user_message: &str,
    ) -> AppResult<ChatReply> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };

        self.history.get_or_create_session(&session_id)?;
        self.history.append(&session_id, Role::User, user_message)?;

        let mut messages: Vec<ChatMessage> = self
            .history
            .history(&session_id)?
            .into_iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content,
            })
            .collect();

        let context = self.store.relevant_context(user_message, self.top_k);
        if !context.is_empty() {
            tracing::debug!(
                "Injecting {} bytes of retrieved context into session '{}'",
                context.len(),
                session_id
            );
            messages.insert(0, ChatMessage::system(context));
        } else {
            tracing::debug!("No knowledge-base context for session '{}'", session_id);
        }

        let request =
            ChatRequest::new(messages, &self.model).with_max_tokens(DEFAULT_MAX_TOKENS);

        let completion = self.client.complete(&request).await?;

        self.history
            .append(&session_id, Role::Assistant, &completion.content)?;

        let history = self.history.history(&session_id)?;

        tracing::info!(
            "Chat turn completed for session '{}' ({} messages)",
            session_id,
            history.len()
        );

        Ok(ChatReply {
            session_id,
            reply: completion.content,
            history,
        })
    }
}
