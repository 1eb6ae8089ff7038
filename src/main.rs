//! TuxTalks Resolver - replay recorded recognition sessions
//!
//! Feeds the events of a recorded session through the resolver exactly as a
//! live engine would, from a separate thread, and reports the decision.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tuxtalks_resolver::audit;
use tuxtalks_resolver::engine::{RecognitionScript, ScriptedEngine};
use tuxtalks_resolver::{ChoicePrompt, Notification, Prompt, Resolver, ResolverConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded recognition session
    Replay {
        /// JSON script with choices and engine events
        script: PathBuf,

        /// Treat the user as attentive (relaxed confidence)
        #[arg(long)]
        aware: bool,

        /// Append decisions to the audit log
        #[arg(long)]
        audit: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ResolverConfig::load_from(path)?,
        None => ResolverConfig::load()?,
    };

    // Setup logging
    let fallback = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Command::Replay {
            script,
            aware,
            audit,
        } => replay(config, &script, aware, audit).await,
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn replay(config: ResolverConfig, path: &Path, aware: bool, write_audit: bool) -> Result<()> {
    let script = RecognitionScript::load(path)?;
    let attempts = script.events.iter().filter(|e| e.is_terminal()).count();
    info!(
        "🐧 Replaying {} events ({} attempt(s)) from {}",
        script.events.len(),
        attempts,
        path.display()
    );

    let resolver = Arc::new(Resolver::new(ScriptedEngine::new(), config));
    resolver.set_awareness(aware || script.aware)?;

    let mut notifications = resolver.subscribe();
    let observer = tokio::spawn(async move {
        let audit_path = audit::log_path();
        loop {
            match notifications.recv().await {
                Ok(notification) => {
                    if write_audit && notification.is_decision() {
                        if let Err(e) = audit::log_decision(&audit_path, &notification) {
                            warn!("⚠️ Could not write audit log: {}", e);
                        }
                    }
                    if let Notification::HandlerInvocation { reason } = &notification {
                        info!("🔁 Rejected ({}), a live prompt would ask again", reason);
                    }
                }
                Err(RecvError::Lagged(missed)) => warn!("Observer missed {} notifications", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let choices = script.prepared_choices();
    debug!("Prompt phrasings: {:?}", choices.phrases());
    let (prompt, outcome) = ChoicePrompt::new(Arc::new(choices), script.accepted);
    let prompt: Arc<dyn Prompt> = prompt;
    resolver.show(prompt.clone())?;

    // Engine events arrive on their own thread, as with a live engine
    let feeder = {
        let resolver = resolver.clone();
        let events = script.events.clone();
        tokio::task::spawn_blocking(move || {
            for event in events {
                resolver.handle(event);
            }
        })
    };
    feeder.await.context("Event feeder panicked")?;

    if resolver.dismiss(&prompt)? {
        info!("Script ended with the prompt still active");
    }
    info!(
        "Engine: {} start(s), {} restart(s), {} stop(s)",
        resolver.engine().starts(),
        resolver.engine().restarts(),
        resolver.engine().stops()
    );

    // Drop the last sender handles so receivers see the end
    drop(prompt);
    drop(resolver);
    observer.await.context("Observer panicked")?;

    match outcome.await {
        Ok(Ok(result)) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Ok(Err(e)) => Err(anyhow::anyhow!("Recognition failed: {}", e)),
        Err(_) => {
            println!("No choice accepted");
            Ok(())
        }
    }
}
