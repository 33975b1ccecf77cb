mod commands;
mod format;
mod gateway;

use clap::{Parser, Subcommand};
use cuentas_core::{
    clock::SystemClock,
    config::{self, Config},
    shellexpand,
    traits::FinancialBackend,
};
use cuentas_memory::AuditLogger;
use cuentas_providers::{HttpBackend, LlmClassifier, LlmHumanizer};
use gateway::Processor;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "cuentas",
    version,
    about = "Cuentas: conversational personal-finance assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant from the terminal.
    Chat {
        /// Console user name; the user key is `console:<user>`.
        #[arg(short, long, default_value = "local")]
        user: String,
    },
    /// Send a one-shot message through the full pipeline.
    Ask {
        /// Console user name.
        #[arg(short, long, default_value = "local")]
        user: String,
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Show configuration and check backend availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Chat { user } => {
            let _guard = init_logging(&cfg, true);
            let processor = build_processor(&cfg).await?;
            let _sweeper = processor.spawn_sweeper();
            chat(&processor, &format!("console:{user}"), &cfg.cuentas.name).await?;
        }
        Commands::Ask { user, message } => {
            init_logging(&cfg, false);
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: cuentas ask <message>");
            }
            let processor = build_processor(&cfg).await?;
            let reply = processor
                .process_message(&format!("console:{user}"), &message.join(" "))
                .await;
            println!("{reply}");
        }
        Commands::Status => {
            init_logging(&cfg, false);
            status(&cli.config, &cfg).await?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` overrides the configured level.
///
/// With `to_file`, logs go to a daily rolling file under `{data_dir}/logs`
/// instead of stderr, so they don't interleave with the chat.
fn init_logging(cfg: &Config, to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.cuentas.log_level));

    if to_file {
        let dir = std::path::PathBuf::from(shellexpand(&cfg.cuentas.data_dir)).join("logs");
        let appender = tracing_appender::rolling::daily(dir, "cuentas.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        None
    }
}

/// Wire the configured collaborators into a processor.
async fn build_processor(cfg: &Config) -> anyhow::Result<Arc<Processor>> {
    if cfg.classifier.resolved_api_key().is_none() {
        warn!("no classifier API key configured; set [classifier].api_key or OPENAI_API_KEY");
    }

    let backend = Arc::new(HttpBackend::from_config(&cfg.backend)?);
    let classifier = Arc::new(LlmClassifier::from_config(&cfg.classifier));
    let mut processor = Processor::new(cfg.clone(), classifier, backend, Arc::new(SystemClock));

    if cfg.humanizer.enabled {
        processor =
            processor.with_humanizer(Arc::new(LlmHumanizer::from_config(&cfg.humanizer)));
    }
    if cfg.audit.enabled {
        processor = processor.with_audit(AuditLogger::open(&cfg.audit).await?);
    }

    info!(
        "processor ready | backend: {} | model: {} | humanizer: {}",
        cfg.backend.base_url,
        cfg.classifier.model,
        if cfg.humanizer.enabled { "on" } else { "off" }
    );
    Ok(Arc::new(processor))
}

/// Console channel: one line in, one reply out, until EOF or `/salir`.
async fn chat(processor: &Arc<Processor>, user_key: &str, name: &str) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("{name}: escribe /ayuda para ver ejemplos, /salir para terminar.\n").as_bytes())
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "/salir" | "/exit" | "/quit") {
            break;
        }

        let reply = processor.process_message(user_key, text).await;
        stdout.write_all(format!("{reply}\n\n").as_bytes()).await?;
    }

    info!(
        "chat ended | pending confirmations: {} | active conversations: {}",
        processor.pending_count(),
        processor.active_conversations()
    );
    Ok(())
}

async fn status(config_path: &str, cfg: &Config) -> anyhow::Result<()> {
    println!("Cuentas: status check\n");
    println!("Config: {config_path}");
    println!("Backend: {}", cfg.backend.base_url);
    println!("Classifier model: {}", cfg.classifier.model);
    println!(
        "Humanizer: {}",
        if cfg.humanizer.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "Audit log: {}",
        if cfg.audit.enabled {
            shellexpand(&cfg.audit.db_path)
        } else {
            "disabled".to_string()
        }
    );
    println!("Mapped accounts: {}", cfg.accounts.len());
    println!();

    let backend = HttpBackend::from_config(&cfg.backend)?;
    println!(
        "  backend: {}",
        if backend.is_available().await {
            "available"
        } else {
            "unreachable"
        }
    );
    println!(
        "  classifier key: {}",
        if cfg.classifier.resolved_api_key().is_some() {
            "configured"
        } else {
            "missing"
        }
    );
    Ok(())
}
