//! `leadbot chat`: interactive or single-message mode.

use anyhow::Context;
use leadbot_agent::ChatSession;
use leadbot_config::AppConfig;
use leadbot_core::event::{DomainEvent, EventBus};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

pub async fn run(message: Option<String>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    // Check for an API key early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    LEADBOT_API_KEY=...   (generic)");
        eprintln!("    GROQ_API_KEY=gsk_...  (Groq, the default backend)");
        eprintln!("    OPENAI_API_KEY=sk-... (with LEADBOT_BASE_URL=https://api.openai.com/v1)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        anyhow::bail!("No API key found. See above for setup instructions.");
    }

    let event_bus = Arc::new(EventBus::default());
    let llm = Arc::new(
        leadbot_providers::build_from_config(&config.provider)?.with_event_bus(event_bus.clone()),
    );
    let tools = Arc::new(leadbot_tools::default_registry(
        Arc::new(config.company.clone()),
        &config.storage.data_dir,
    )?);

    spawn_event_logger(&event_bus);

    let mut session = leadbot_agent::session_from_config(&config, llm, tools, event_bus);

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let answer = session.handle(&msg).await;
        eprint!("\r              \r");
        println!("{answer}");
        return Ok(());
    }

    interactive(&config, &mut session).await
}

async fn interactive(config: &AppConfig, session: &mut ChatSession) -> anyhow::Result<()> {
    println!();
    println!("  {} Assistant (interactive mode)", config.company.name);
    println!();
    println!("  Provider:  {}", config.provider.name);
    println!("  Models:    {}", config.provider.models.join(" -> "));
    println!("  Leads dir: {}", config.storage.data_dir.display());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
    println!("  Assistant > {}", session.greeting());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let answer = session.handle(&line).await;
        eprint!("\r     \r");
        println!();
        for text in answer.lines() {
            println!("  Assistant > {text}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

/// Surface model fallbacks and failed turns in the log.
fn spawn_event_logger(event_bus: &EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event logger lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match event.as_ref() {
                DomainEvent::ModelFallback {
                    from_model,
                    to_model,
                    ..
                } => tracing::info!(from = %from_model, to = %to_model, "Switched model"),
                DomainEvent::TurnFailed { error_message, .. } => {
                    tracing::error!(error = %error_message, "Turn failed after retries")
                }
                other => tracing::trace!(event = ?other, "Domain event"),
            }
        }
    });
}
