//! Command-line client for the bookkeeping API
//!
//! Single binary that:
//! 1. Loads the API endpoint and saved credential from config
//! 2. Runs one command through the authenticated client
//! 3. Prints the JSON result to stdout (logs go to stderr)
//! 4. Writes the possibly refreshed or cleared credential back to the token file

mod command;
mod config;
mod token_file;

use std::sync::Arc;

use anyhow::{Context, Result};
use api_auth::{CredentialStore, MemoryCredentialStore};
use api_client::{AuthenticatedClient, Session, TracingSink};
use api_transport::HttpTransport;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::Command;
use crate::config::{Config, LogFormat};

/// Split `--config <path>` from the command words.
fn parse_args(args: &[String]) -> (Option<&str>, Vec<String>) {
    let config_pos = args.iter().position(|a| a == "--config");
    let config_path = config_pos
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());
    let rest = args
        .iter()
        .enumerate()
        .filter(|(i, _)| match config_pos {
            Some(pos) => *i != pos && *i != pos + 1,
            None => true,
        })
        .map(|(_, a)| a.clone())
        .collect();
    (config_path, rest)
}

/// Initialize tracing with LOG_LEVEL / RUST_LOG support, writing to stderr.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (cli_config_path, rest) = parse_args(&args);
    let command = Command::parse(&rest)?;

    let config_path = Config::resolve_path(cli_config_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    init_tracing(config.log.format);
    info!(
        path = %config_path.display(),
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        signed_in = config.session.token.is_some(),
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!("api-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let transport = Arc::new(HttpTransport::new(
        http,
        config.api.base_url.clone(),
        config.timeout(),
    ));
    let store = Arc::new(match config.session.token.clone() {
        Some(credential) => MemoryCredentialStore::with_credential(credential),
        None => MemoryCredentialStore::new(),
    });
    let client = AuthenticatedClient::with_config(
        transport,
        store.clone(),
        Arc::new(TracingSink),
        config.client_config(),
    );
    let session = Session::new(Arc::new(client));

    let outcome = command.run(&session).await;

    // Persist whatever the command left behind, including a cleared session
    if let Some(ref token_file) = config.session.token_file {
        let current = store.get();
        if current != config.session.token {
            if let Err(e) = token_file::save(token_file, current.as_ref()).await {
                warn!(path = %token_file.display(), error = %e, "failed to update token file");
            }
        }
    }

    let value = outcome.with_context(|| format!("{} failed", command.name()))?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
