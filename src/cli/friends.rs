use anyhow::Result;
use clap::Subcommand;

use crate::backend::types::FriendRequest;
use crate::backend::BackendClient;
use crate::core::AppConfig;
use crate::friends::FriendshipDirectory;
use crate::notify::RefreshBus;

use super::auth;

#[derive(Subcommand)]
pub enum FriendsCommand {
    /// List current friends
    List {},
    /// Look up an account by email
    Search {
        #[arg(long)]
        email: String,
    },
    /// Send a friend request
    Add {
        #[arg(long)]
        email: String,
    },
    /// List pending and past requests
    Requests {
        /// Show requests you sent instead of requests you received
        #[arg(long, default_value = "false")]
        sent: bool,
    },
    /// Accept a received request
    Accept {
        #[arg(long)]
        id: String,
    },
    /// Decline a received request
    Decline {
        #[arg(long)]
        id: String,
    },
}

fn print_requests(requests: &[FriendRequest]) {
    if requests.is_empty() {
        println!("No requests.");
        return;
    }
    for request in requests {
        let who = request
            .user
            .as_ref()
            .map(|u| u.label().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{}  {}  [{}]", request.id, who, request.status.as_str());
    }
}

pub async fn run(command: FriendsCommand, config: &AppConfig) -> Result<()> {
    let client = BackendClient::new(&config.api_base_url);
    let session = auth::load_session(config);
    let mut directory = FriendshipDirectory::new(client, RefreshBus::new());

    match command {
        FriendsCommand::List {} => {
            let snapshot = directory.refresh(&session).await?;
            if snapshot.friends.is_empty() {
                println!("No friends yet. Send a request with `huddle friends add`.");
            }
            for friend in &snapshot.friends {
                let email = friend.email.as_deref().unwrap_or("-");
                println!("{}  {}  <{}>", friend.id, friend.label(), email);
            }
        }
        FriendsCommand::Search { email } => {
            let user = directory.search(&session, &email).await?;
            println!("{}  {}", user.id, user.label());
        }
        FriendsCommand::Add { email } => {
            directory.refresh(&session).await?;
            match directory.send_request(&session, &email).await? {
                Some(request) => println!("Request {} sent to {}.", request.id, email),
                None => println!("Request sent to {}.", email),
            }
        }
        FriendsCommand::Requests { sent } => {
            let snapshot = directory.refresh(&session).await?;
            if sent {
                print_requests(&snapshot.sent);
            } else {
                print_requests(&snapshot.received);
            }
        }
        FriendsCommand::Accept { id } => {
            directory.respond(&session, &id, true).await?;
            println!("Request {} accepted.", id);
        }
        FriendsCommand::Decline { id } => {
            directory.respond(&session, &id, false).await?;
            println!("Request {} declined.", id);
        }
    }

    Ok(())
}
