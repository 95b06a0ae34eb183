//! Leadbot CLI, the main entry point.
//!
//! Commands:
//! - `onboard`  Write a default config and create the data directory
//! - `chat`     Interactive chat or single-message mode
//! - `tools`    Print the tool schemas sent to the model
//! - `submit`   Submit an inquiry or job application without the model

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "leadbot",
    about = "Leadbot, a company assistant that answers visitors and captures leads",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory
    Onboard,

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the tool schemas as JSON
    Tools,

    /// Submit a lead directly
    Submit {
        #[arg(value_enum)]
        kind: commands::submit::LeadKind,

        /// Form fields as a JSON object
        #[arg(short, long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Submit { kind, data } => commands::submit::run(kind, &data).await?,
    }

    Ok(())
}
