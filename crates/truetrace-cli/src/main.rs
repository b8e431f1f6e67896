//! TrueTrace CLI - tamper-evident event chain.
//!
//! Creates signed, hash-linked events in a local chain file and verifies
//! the chain's integrity.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use truetrace_cli::config_bridge;
use truetrace_config::{Config, LoadOptions};

mod commands;
mod context;
mod formatter;
mod theme;

use commands::{chain, config, event, keys};
use context::Context;
use formatter::OutputFormat;

/// TrueTrace - tamper-evident event chain
#[derive(Parser)]
#[command(name = "truetrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Additional configuration file, applied after user and workspace config
    #[arg(short, long, global = true, env = "TRUETRACE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the signing key
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Create and validate events
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Inspect and verify the chain
    Chain {
        #[command(subcommand)]
        command: ChainCommands,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Show the current key (public key and key ID)
    Show,
    /// Generate a new key pair (prompts if one already exists)
    Generate {
        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum EventCommands {
    /// Create, sign and append an event
    Create {
        /// Event type
        #[arg(short = 't', long = "type")]
        event_type: String,
        /// Payload as a JSON document
        #[arg(short, long)]
        payload: String,
        /// Origin (defaults to `events.origin` from config)
        #[arg(short, long)]
        origin: Option<String>,
    },
    /// Validate a single event JSON file
    Validate {
        /// Path to the event document
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ChainCommands {
    /// List events, or show one
    Show {
        /// Show the event at this index
        #[arg(long, conflicts_with = "latest")]
        index: Option<usize>,
        /// Show the most recent event
        #[arg(long)]
        latest: bool,
    },
    /// Find events whose JSON contains the query (case-insensitive)
    Search {
        /// Text to look for
        query: String,
    },
    /// Validate every event on its own
    Verify,
    /// Full integrity report including linkage; exits non-zero on issues
    Diagnostics,
    /// Check the latest event
    Health,
    /// Rebuild and re-sign the whole chain with the configured key
    Resign {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved configuration with source annotations
    Show,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let base = std::env::current_dir()?;
    let options = LoadOptions {
        workspace_root: Some(base.clone()),
        user_dir: None,
        explicit_file: cli.config.clone(),
    };
    let resolved = Config::load(&options)?;

    let mut log_config = config_bridge::to_log_config(&resolved.config, &base);
    if cli.verbose {
        log_config = log_config.verbose();
    }
    if let Err(e) = truetrace_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let ctx = Context {
        resolved,
        base,
        format: cli.format,
    };

    match cli.command {
        Commands::Keys { command } => handle_keys(&ctx, &command).map(|()| ExitCode::SUCCESS),
        Commands::Event { command } => handle_event(&ctx, command),
        Commands::Chain { command } => handle_chain(&ctx, command),
        Commands::Config { command } => match command {
            ConfigCommands::Show => config::show_config(&ctx).map(|()| ExitCode::SUCCESS),
        },
    }
}

fn handle_keys(ctx: &Context, command: &KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Show => keys::show_key(ctx),
        KeyCommands::Generate { force } => keys::generate_key(ctx, *force),
    }
}

fn handle_event(ctx: &Context, command: EventCommands) -> Result<ExitCode> {
    match command {
        EventCommands::Create {
            event_type,
            payload,
            origin,
        } => event::create_event(ctx, &event_type, &payload, origin.as_deref()),
        EventCommands::Validate { file } => event::validate_file(ctx, &file),
    }
}

fn handle_chain(ctx: &Context, command: ChainCommands) -> Result<ExitCode> {
    match command {
        ChainCommands::Show { index, latest } => {
            chain::show_chain(ctx, index, latest).map(|()| ExitCode::SUCCESS)
        },
        ChainCommands::Search { query } => {
            chain::search_chain(ctx, &query).map(|()| ExitCode::SUCCESS)
        },
        ChainCommands::Verify => chain::verify_chain(ctx),
        ChainCommands::Diagnostics => chain::diagnose_chain(ctx),
        ChainCommands::Health => chain::chain_health(ctx),
        ChainCommands::Resign { yes } => chain::resign_chain(ctx, yes).map(|()| ExitCode::SUCCESS),
    }
}
