//! Terminal driver for one scheduling session.
//!
//! Stands in for the voice transport: each line typed is a caller utterance
//! or a command (see `/help`). With `--echo`, utterances go through the full
//! turn loop with an echoing model; otherwise the operator plays the model
//! with `/tool` and `/reply`.

mod command;

use std::path::PathBuf;
use std::sync::Arc;

use agent_tools::{scheduling_registry_with_rates, CostRates, SlotCatalog, StaticCalendar};
use clap::Parser;
use database::Database;
use mock_brain::{DigestSummarizer, EchoBrain};
use orchestrator::{
    Orchestrator, OrchestratorError, OrchestratorSettings, SessionEvent, SummaryFinalizer,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::command::{Command, HELP_TEXT};

#[derive(Debug, Parser)]
#[command(name = "scheduler-console")]
#[command(about = "Drive a scheduling assistant session from the terminal")]
struct Args {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:data/scheduler.db?mode=rwc")]
    database_url: String,

    /// JSON slot calendar (defaults to the built-in sample calendar)
    #[arg(long, env = "SCHEDULER_SLOTS_FILE")]
    slots_file: Option<PathBuf>,

    /// Session id (defaults to a timestamp)
    #[arg(long)]
    session: Option<String>,

    /// Send utterances through the turn loop with an echoing model
    #[arg(long)]
    echo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "scheduler_console=info,orchestrator=info,agent_tools=info",
                )
            }),
        )
        .init();

    let args = Args::parse();

    if let Some(dir) = sqlite_parent_dir(&args.database_url) {
        std::fs::create_dir_all(dir)?;
    }
    let db = Arc::new(Database::connect(&args.database_url).await?);
    db.migrate().await?;

    let catalog: Arc<dyn SlotCatalog> = match &args.slots_file {
        Some(path) => Arc::new(StaticCalendar::from_json_file(path)?),
        None => Arc::new(StaticCalendar::sample()),
    };

    let rates = CostRates::from_env();
    let registry = Arc::new(scheduling_registry_with_rates(
        db.clone(),
        catalog,
        rates.clone(),
    ));
    let finalizer = SummaryFinalizer::new(Arc::new(DigestSummarizer), db.clone(), rates);
    let orchestrator = Orchestrator::new(
        Arc::new(EchoBrain::with_prefix("You said: ")),
        registry,
        finalizer,
        OrchestratorSettings::from_env(),
    );

    let session_id = args
        .session
        .unwrap_or_else(|| format!("console-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")));
    info!("Session {} started", session_id);
    println!("Session {}. Type /help for commands.", session_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match run(&orchestrator, &session_id, command, args.echo).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => break,
            Err(OrchestratorError::SessionEnded(_)) => {
                println!("The conversation has ended.");
                break;
            }
            Err(e) => {
                warn!("Event failed: {}", e);
                println!("error: {}", e);
            }
        }
    }

    if let Some(snapshot) = orchestrator.session_snapshot(&session_id).await {
        println!("Total cost: ${:.6}", snapshot.costs.total);
    }
    db.close().await;
    Ok(())
}

enum Flow {
    Continue,
    Stop,
}

async fn run(
    orchestrator: &Orchestrator,
    session_id: &str,
    command: Command,
    echo: bool,
) -> Result<Flow, OrchestratorError> {
    match command {
        Command::Say(text) if echo => {
            let turn = orchestrator.handle_utterance(session_id, &text).await?;
            if let Some(reply) = turn.reply {
                println!("assistant: {}", reply);
            }
        }
        Command::Say(text) => {
            orchestrator
                .apply(session_id, SessionEvent::UserUtterance(text))
                .await?;
        }
        Command::Reply(text) => {
            orchestrator
                .apply(session_id, SessionEvent::AssistantReply(text.clone()))
                .await?;
            println!("assistant: {}", text);
        }
        Command::Tool { name, arguments } => {
            let record = orchestrator
                .apply(session_id, SessionEvent::ToolCall { name, arguments })
                .await?;
            if let Some(record) = record {
                println!("{}", record.result.to_json());
            }
        }
        Command::Tools => {
            for def in orchestrator.tool_definitions() {
                println!(
                    "  {}: {}",
                    def.name(),
                    def.function.description.as_deref().unwrap_or_default()
                );
            }
        }
        Command::Costs => {
            if let Some(snapshot) = orchestrator.session_snapshot(session_id).await {
                for (service, cost) in &snapshot.costs.by_service {
                    println!("  {:<24} ${:.6}", service, cost);
                }
                println!("  {:<24} ${:.6}", "total", snapshot.costs.total);
            }
        }
        Command::Session => {
            if let Some(snapshot) = orchestrator.session_snapshot(session_id).await {
                match serde_json::to_string_pretty(&snapshot) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("error: {}", e),
                }
            }
        }
        Command::Help => println!("{}", HELP_TEXT),
        Command::Quit => return Ok(Flow::Stop),
    }

    if let Some(snapshot) = orchestrator.session_snapshot(session_id).await {
        if snapshot.ended {
            match &snapshot.summary {
                Some(summary) => println!("Summary saved: {}", summary.summary),
                None => println!("Conversation ended, no summary saved."),
            }
            return Ok(Flow::Stop);
        }
    }
    Ok(Flow::Continue)
}

/// Directory holding a file-backed SQLite URL, so it can be created first.
fn sqlite_parent_dir(url: &str) -> Option<PathBuf> {
    let path = url.strip_prefix("sqlite:")?;
    let path = path.split('?').next()?.trim_start_matches("//");
    if path.is_empty() || path.starts_with(':') {
        return None;
    }
    PathBuf::from(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
}
