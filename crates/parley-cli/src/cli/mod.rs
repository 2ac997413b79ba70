//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Chat transcript engine: show, send, receive and clear conversations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Conversation selector shared by the transcript commands.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct ConversationArgs {
    /// Conversation identifier
    #[arg(long, env = "PARLEY_ID", value_name = "ID")]
    pub(crate) id: String,

    /// JSON array of initial messages, used to seed a new conversation
    #[arg(long, value_name = "PATH")]
    pub(crate) initial: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Prints the rendered transcript
    Show {
        #[command(flatten)]
        conversation: ConversationArgs,

        /// Print the display model as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Output width in columns
        #[arg(long, default_value_t = parley_render::terminal::DEFAULT_WIDTH)]
        width: usize,
    },
    /// Sends a user message and prints the outbound update
    Send {
        #[command(flatten)]
        conversation: ConversationArgs,

        /// Message text
        #[arg(short, long)]
        text: Option<String>,

        /// File to attach
        #[arg(short, long, value_name = "PATH")]
        attach: Option<String>,
    },
    /// Applies a message list from the host and prints the transcript
    Receive {
        #[command(flatten)]
        conversation: ConversationArgs,

        /// JSON array of messages ("-" or omitted reads stdin)
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Empties the transcript and removes its stored copy
    Clear {
        #[command(flatten)]
        conversation: ConversationArgs,
    },
    /// Downloads an attachment or asset source
    Download {
        /// Data URI or URL
        #[arg(long)]
        source: String,

        /// File name to save as
        #[arg(long)]
        name: String,

        /// Output directory (default: config download dir)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let load_config = || config::Config::load().context("load config");

    match cli.command {
        Commands::Show {
            conversation,
            json,
            width,
        } => {
            let host = commands::chat::Host::open(&load_config()?, conversation)?;
            commands::chat::show(&host, json, width)
        }
        Commands::Send {
            conversation,
            text,
            attach,
        } => {
            let host = commands::chat::Host::open(&load_config()?, conversation)?;
            commands::chat::send(host, text, attach).await
        }
        Commands::Receive { conversation, file } => {
            let host = commands::chat::Host::open(&load_config()?, conversation)?;
            commands::chat::receive(host, file.as_deref())
        }
        Commands::Clear { conversation } => {
            let host = commands::chat::Host::open(&load_config()?, conversation)?;
            commands::chat::clear(host)
        }
        Commands::Download { source, name, out } => {
            commands::download::run(&load_config()?, &source, &name, out).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
