//! Cardpress CLI entry point.
//!
//! Commands:
//! - `onboard`  Write a starter config
//! - `publish`  Run one publish invocation
//! - `resolve`  Preview token resolution for a piece of text
//! - `gateway`  Start the HTTP trigger surface
//! - `doctor`   Diagnose configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "cardpress",
    about = "Publish informational cards as immutable, cacheable JSON",
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
    /// Write a starter configuration file
    Onboard,

    /// Fetch a content record, resolve static tokens, and publish the card
    Publish {
        /// Path of the content record on the source host
        #[arg(short, long)]
        path: Option<String>,

        /// Override the configured source host
        #[arg(long)]
        source_host: Option<String>,

        /// Override the configured destination host
        #[arg(long)]
        destination_host: Option<String>,

        /// Static token as NAME=VALUE (repeatable)
        #[arg(short, long = "token", value_parser = commands::parse_key_val)]
        tokens: Vec<(String, String)>,

        /// Write to an in-memory destination and print the artifact
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve tokens in a piece of text
    Resolve {
        /// Text containing {{ tokens }}
        text: String,

        /// Static token as NAME=VALUE (repeatable)
        #[arg(short, long = "token", value_parser = commands::parse_key_val)]
        tokens: Vec<(String, String)>,

        /// Profile value as KEY=VALUE for a render-time preview (repeatable)
        #[arg(long = "profile", value_parser = commands::parse_key_val)]
        profile: Vec<(String, String)>,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose configuration
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
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
        Commands::Publish {
            path,
            source_host,
            destination_host,
            tokens,
            dry_run,
        } => {
            commands::publish::run(commands::publish::PublishArgs {
                path,
                source_host,
                destination_host,
                tokens,
                dry_run,
            })
            .await?
        }
        Commands::Resolve {
            text,
            tokens,
            profile,
        } => commands::resolve::run(&text, tokens, profile).await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
