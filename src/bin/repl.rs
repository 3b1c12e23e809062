//! Headless text REPL over the conversation pipeline.
//!
//! Reads user turns as lines from stdin and prints the assistant's
//! responses to stdout. Runs with the offline generation collaborator
//! and no search backend, so it exercises the full session/pipeline
//! path without any models present; embedders wire in real engines
//! through the same traits.
//!
//! Tracing goes to stderr so stdout stays a clean conversation.

use std::io::{BufRead, Write};
use std::sync::Arc;

use siris::services::{NoopSearch, OfflineGeneration};
use siris::{RequestPipeline, SessionStore, SirisConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SirisConfig::load_or_default();
    let store = Arc::new(
        SessionStore::open(&config.session.history_dir, config.session.max_tokens).await?,
    );
    let pipeline = RequestPipeline::new(
        Arc::clone(&store),
        Arc::new(OfflineGeneration),
        Arc::new(NoopSearch),
        &config,
    );

    if let Some(session) = store.current().await {
        tracing::info!(name = %session.name, "session ready");
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() || query == "exit" {
            if query == "exit" {
                break;
            }
            print!("> ");
            stdout.flush()?;
            continue;
        }

        let outcome = pipeline.process(query, config.search.enabled).await?;
        println!("{}", outcome.response);
        print!("> ");
        stdout.flush()?;
    }

    tracing::info!("siris-repl shutting down");
    Ok(())
}
