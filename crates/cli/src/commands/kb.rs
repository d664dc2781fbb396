//! Knowledge base command handler.

use clap::{Args, Subcommand};
use lorebase_core::{config::AppConfig, AppResult};
use lorebase_knowledge::{create_provider, DocumentStore, KnowledgeConfig, DEFAULT_EMBEDDING_DIM};
use std::path::PathBuf;

/// Knowledge base operations
#[derive(Args, Debug)]
pub struct KbCommand {
    #[command(subcommand)]
    pub action: KbAction,
}

#[derive(Subcommand, Debug)]
pub enum KbAction {
    /// Index the document directory and report stats
    Load(KbLoadCommand),
    /// Search the knowledge base
    Search(KbSearchCommand),
    /// Print the prompt-ready context block for a query
    Context(KbContextCommand),
    /// List indexed documents
    Documents(KbDocumentsCommand),
}

/// Build a store from configuration and index the document directory.
///
/// The index lives only in memory, so every command starts with a fresh
/// load of the knowledge directory.
pub(crate) fn load_store(config: &AppConfig) -> AppResult<DocumentStore> {
    let knowledge_config = KnowledgeConfig {
        chunk_size: config.chunk_size,
        chunk_overlap: config.chunk_overlap,
        embedding_dim: DEFAULT_EMBEDDING_DIM,
    };

    let provider = create_provider("hashing", knowledge_config.embedding_dim)?;
    let store = DocumentStore::new(knowledge_config, provider);
    store.load(&config.kb_dir)?;

    Ok(store)
}

/// Index the document directory
#[derive(Args, Debug)]
pub struct KbLoadCommand {
    /// Directory to index (defaults to the configured knowledge directory)
    pub dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KbLoadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let dir = self.dir.clone().unwrap_or_else(|| config.kb_dir.clone());
        tracing::info!("Executing kb load command for {:?}", dir);

        let knowledge_config = KnowledgeConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        };
        let provider = create_provider("hashing", knowledge_config.embedding_dim)?;
        let store = DocumentStore::new(knowledge_config, provider);

        let stats = store.load(&dir)?;

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "chunks": stats.chunks,
                "bytesProcessed": stats.bytes_processed,
                "skipped": stats.skipped,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        } else {
            println!(
                "Indexed {} documents ({} chunks, {} bytes, {} skipped) in {:.2}s",
                stats.documents, stats.chunks, stats.bytes_processed, stats.skipped, stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Search the knowledge base
#[derive(Args, Debug)]
pub struct KbSearchCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "3")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KbSearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing kb search command");

        let store = load_store(config)?;
        let results = store.search(&self.query, self.top_k);

        if self.json {
            let output: Vec<_> = results
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "content": r.chunk.content,
                        "source": r.chunk.metadata.source,
                        "score": r.score,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        } else if results.is_empty() {
            println!("No results.");
        } else {
            for (i, result) in results.iter().enumerate() {
                println!(
                    "{}. [{:.3}] {}",
                    i + 1,
                    result.score,
                    result.chunk.metadata.source.display()
                );
                println!("   {}", result.chunk.content);
            }
        }

        Ok(())
    }
}

/// Print the context block for a query
#[derive(Args, Debug)]
pub struct KbContextCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "3")]
    pub top_k: usize,
}

impl KbContextCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing kb context command");

        let store = load_store(config)?;
        let context = store.relevant_context(&self.query, self.top_k);

        if context.is_empty() {
            tracing::info!("No context available for this query");
        } else {
            println!("{}", context);
        }

        Ok(())
    }
}

/// List indexed documents
#[derive(Args, Debug)]
pub struct KbDocumentsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KbDocumentsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing kb documents command");

        let store = load_store(config)?;
        let documents = store.documents();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents).unwrap());
        } else if documents.is_empty() {
            println!("No documents indexed.");
        } else {
            for doc in &documents {
                println!(
                    "{} ({} chunks, {} bytes, modified {})",
                    doc.source.display(),
                    doc.chunks,
                    doc.size_bytes,
                    doc.last_modified
                );
            }

            let stats = store.stats();
            println!("Total: {} documents, {} chunks", stats.sources, stats.chunks);
        }

        Ok(())
    }
}

impl KbCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            KbAction::Load(cmd) => cmd.execute(config).await,
            KbAction::Search(cmd) => cmd.execute(config).await,
            KbAction::Context(cmd) => cmd.execute(config).await,
            KbAction::Documents(cmd) => cmd.execute(config).await,
        }
    }
}
