use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod events;
pub mod friends;
pub mod hangout;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {},
    /// Sign in and persist the session
    Signin {},
    /// Forget the saved session
    Signout {},
    /// Show the signed-in user's profile
    Whoami {},
    /// Manage friends and friend requests
    Friends {
        #[command(subcommand)]
        action: friends::FriendsCommand,
    },
    /// Propose hangouts and respond to invitations
    Hangout {
        #[command(subcommand)]
        action: hangout::HangoutCommand,
    },
    /// Show and edit the calendar
    Events {
        #[command(subcommand)]
        action: events::EventsCommand,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let config = AppConfig::default();

    // Handle each sub command
    match args.command {
        Some(Command::Register {}) => {
            auth::register(&config).await?;
        }
        Some(Command::Signin {}) => {
            auth::signin(&config).await?;
        }
        Some(Command::Signout {}) => {
            auth::signout(&config)?;
        }
        Some(Command::Whoami {}) => {
            auth::whoami(&config).await?;
        }
        Some(Command::Friends { action }) => {
            friends::run(action, &config).await?;
        }
        Some(Command::Hangout { action }) => {
            hangout::run(action, &config).await?;
        }
        Some(Command::Events { action }) => {
            events::run(action, &config).await?;
        }
        None => {}
    }

    Ok(())
}
