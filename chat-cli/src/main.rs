//! # chat-cli
//!
//! CLI tool for talking to a simple-chat server.
//!
//! ## Commands
//!
//! - `listen`: Print notifications and incoming messages
//! - `send`: Send a message or typing indicator
//! - `archive`: Load archived messages of a chat
//! - `join` / `leave`: Manage chat membership
//! - `create`: Create a chat
//!
//! ## Example
//!
//! ```bash
//! # Send a message
//! chat-cli --user alice send bob "Hello!"
//!
//! # Join a chat for this connection only, then watch it
//! chat-cli --user alice join lobby --temporary
//! chat-cli --user alice listen
//!
//! # Try it without a server
//! chat-cli --mock --user alice --token x archive lobby --limit 3
//! ```

use anyhow::{Context, Result};
use chat_client::{ChatClient, Transport, WebSocketTransport, WebSocketTransportConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;
mod config;

use commands::{archive, create, demo::DemoTransport, join, leave, listen, send};
use config::{Config, Overrides};

/// CLI tool for talking to a simple-chat server.
#[derive(Parser, Debug)]
#[command(name = "chat-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: config.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server host including scheme, e.g. ws://localhost
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// User to connect as
    #[arg(long, global = true)]
    user: Option<String>,

    /// Access token (will prompt if not provided)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Use an offline demo server instead of a real connection
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print notifications and incoming messages
    Listen {
        /// Exit after this many messages
        #[arg(long)]
        count: Option<usize>,
    },

    /// Send a message or typing indicator
    Send {
        /// Destination chat or user
        to: String,

        /// Message text
        text: Option<String>,

        /// Mark as typing indicator
        #[arg(long)]
        typing: bool,
    },

    /// Load archived messages of a chat
    Archive {
        /// Chat id
        chat: String,

        /// Maximum number of messages
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Only messages after this message id
        #[arg(long)]
        after: Option<String>,
    },

    /// Join a chat
    Join {
        /// Chat id
        chat: String,

        /// Drop membership when this connection closes
        #[arg(long)]
        temporary: bool,
    },

    /// Leave a chat
    Leave {
        /// Chat id
        chat: String,
    },

    /// Create a chat
    Create {
        /// Kind of chat
        #[arg(long, value_enum, default_value = "suc")]
        kind: Kind,

        /// Participant user ids
        #[arg(required = true)]
        users: Vec<String>,
    },
}

/// Kind of chat for `create`.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    /// Single-user chat
    Suc,
    /// Multi-user chat
    Muc,
}

impl From<Kind> for chat_client::ChatType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Suc => Self::Suc,
            Kind::Muc => Self::Muc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(Overrides {
        host: cli.host,
        port: cli.port,
        user_id: cli.user,
        access_token: cli.token,
    });

    init_logging(&config.logging.filter)?;

    let token = match config.connection.access_token.clone() {
        Some(token) => token,
        None if cli.mock => String::new(),
        None => rpassword::prompt_password("Access token: ")
            .context("Failed to read access token")?,
    };
    let chat_config = config.connection.chat_config(&token)?;

    if cli.mock {
        let client = ChatClient::new(chat_config, DemoTransport::new());
        execute(&client, cli.command).await
    } else {
        let transport = WebSocketTransport::with_config(WebSocketTransportConfig {
            connect_timeout: config.connection.connect_timeout(),
            ..Default::default()
        });
        let client = ChatClient::new(chat_config, transport);
        execute(&client, cli.command).await
    }
}

/// Run one command against a client.
async fn execute<T: Transport>(client: &ChatClient<T>, command: Commands) -> Result<()> {
    match command {
        Commands::Listen { count } => listen::run(client, count).await,
        Commands::Send { to, text, typing } => {
            if text.is_none() && !typing {
                anyhow::bail!("Must specify message text or --typing");
            }
            send::run(client, &to, text.as_deref(), typing).await
        }
        Commands::Archive {
            chat,
            limit,
            after,
        } => archive::run(client, &chat, limit, after.as_deref()).await,
        Commands::Join { chat, temporary } => join::run(client, &chat, temporary).await,
        Commands::Leave { chat } => leave::run(client, &chat).await,
        Commands::Create { kind, users } => create::run(client, kind.into(), &users).await,
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the config file.
fn init_logging(filter: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}
