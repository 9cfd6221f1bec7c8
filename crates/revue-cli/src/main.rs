mod display;
mod source;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use revue_client::LanguageToolClient;
use revue_core::{CheckLevel, DecorationSet, extract_paragraphs};
use revue_overlay::{EnabledFlag, OverlayConfig, OverlayEvent, spawn_overlay};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "revue", version, about = "Grammar checking for prose documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a text file and print every finding
    Check {
        /// Plain-text file; blank lines separate paragraphs
        file: PathBuf,

        /// LanguageTool check endpoint
        #[arg(long, env = "REVUE_ENDPOINT")]
        endpoint: Option<String>,

        /// Language code, e.g. fr or en-US
        #[arg(long, env = "REVUE_LANGUAGE")]
        language: Option<String>,

        /// Checker strictness: default or picky
        #[arg(long)]
        level: Option<CheckLevel>,

        /// JSON config file; flags override its values
        #[arg(long, env = "REVUE_CONFIG")]
        config: Option<PathBuf>,

        /// Seconds to wait for the service
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            file,
            endpoint,
            language,
            level,
            config,
            timeout,
        } => {
            let mut config = match config {
                Some(path) => OverlayConfig::from_json_file(&path)?,
                None => OverlayConfig::default(),
            };
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
            }
            if let Some(language) = language {
                config.language = language;
            }
            if let Some(level) = level {
                config.level = level;
            }
            check_file(&file, config, Duration::from_secs(timeout)).await
        }
    }
}

async fn check_file(file: &Path, config: OverlayConfig, timeout: Duration) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let doc = source::parse_document(&text);
    let paragraphs = extract_paragraphs(&doc).len();
    if paragraphs == 0 {
        println!("{}: nothing to check", file.display());
        return Ok(());
    }

    tracing::info!(
        file = %file.display(),
        paragraphs,
        endpoint = %config.endpoint,
        language = %config.language,
        "checking"
    );
    let client = LanguageToolClient::new(config.endpoint.clone())
        .with_max_chars(config.max_chars)
        .with_timeout(config.request_timeout());
    let (handle, mut events) =
        spawn_overlay(config, EnabledFlag::default(), doc.clone(), Arc::new(client));

    handle.force_full_check()?;
    let decorations = tokio::time::timeout(timeout, first_decorations(&mut events))
        .await
        .context("timed out waiting for the grammar service")??;
    handle.destroy()?;

    print!("{}", display::render_report(&doc, &decorations));
    println!(
        "{}",
        display::render_summary(
            &file.display().to_string(),
            paragraphs,
            &decorations,
            chrono::Local::now()
        )
    );
    Ok(())
}

async fn first_decorations(
    events: &mut UnboundedReceiver<OverlayEvent>,
) -> anyhow::Result<DecorationSet> {
    while let Some(event) = events.recv().await {
        if let OverlayEvent::DecorationsChanged(set) = event {
            return Ok(set);
        }
    }
    bail!("overlay closed before the check completed")
}
