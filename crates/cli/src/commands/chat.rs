//! Chat command handler.

use crate::commands::kb::load_store;
use clap::Args;
use lorebase_chat::{ChatService, HistoryStore};
use lorebase_core::{config::AppConfig, AppResult};
use lorebase_llm::create_client;
use std::sync::Arc;

/// Run one chat exchange with retrieval-augmented context
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The message to send
    pub message: String,

    /// Session identifier (a new session is created when omitted)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Print the full session history after the reply
    #[arg(long)]
    pub show_history: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        config.validate()?;
        config.ensure_state_dir()?;

        let store = Arc::new(load_store(config)?);
        let history = HistoryStore::open(&config.history_db)?;
        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
        )?;

        let service = ChatService::new(history, store, client, &config.model, config.top_k);

        let reply = service.reply(self.session.as_deref(), &self.message).await?;

        if self.json {
            let output = serde_json::json!({
                "sessionId": reply.session_id,
                "reply": reply.reply,
                "history": reply.history,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        } else {
            println!("{}", reply.reply);
            println!();
            println!("Session: {}", reply.session_id);

            if self.show_history {
                println!();
                for message in &reply.history {
                    println!("[{}] {}", message.role, message.content);
                }
            }
        }

        Ok(())
    }
}
