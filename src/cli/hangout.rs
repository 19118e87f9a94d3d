use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;

use crate::backend::types::User;
use crate::backend::BackendClient;
use crate::core::AppConfig;
use crate::friends::FriendshipDirectory;
use crate::hangouts::{AlwaysFree, EventDraft, EventProposalCoordinator, FanOutResult};
use crate::notify::RefreshBus;

use super::auth;
use super::events::parse_when;

#[derive(Subcommand)]
pub enum HangoutCommand {
    /// Propose a hangout to one or more friends
    Propose {
        /// Recipient emails, repeatable
        #[arg(long, required = true)]
        to: Vec<String>,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Start time, RFC 3339 (e.g. 2025-06-01T18:00:00Z)
        #[arg(long)]
        date: String,
    },
    /// List proposals waiting on you
    Inbox {},
    /// Accept a received proposal
    Accept {
        #[arg(long)]
        id: String,
    },
    /// Decline a received proposal
    Decline {
        #[arg(long)]
        id: String,
    },
}

fn print_fan_out(result: &FanOutResult) {
    println!(
        "Sent {} proposal(s), {} failed.",
        result.success_count, result.failed_count
    );
    for failure in &result.errors {
        println!("  {}: {}", failure.recipient, failure.reason);
    }
    for advisory in &result.advisories {
        match advisory.suggested {
            Some(when) => println!(
                "  Heads up: {} ({} might work instead)",
                advisory.message,
                when.to_rfc3339()
            ),
            None => println!("  Heads up: {}", advisory.message),
        }
    }
}

pub async fn run(command: HangoutCommand, config: &AppConfig) -> Result<()> {
    let client = BackendClient::new(&config.api_base_url);
    let session = auth::load_session(config);
    let bus = RefreshBus::new();
    let coordinator =
        EventProposalCoordinator::new(client.clone(), Arc::new(AlwaysFree), bus.clone());

    match command {
        HangoutCommand::Propose {
            to,
            title,
            description,
            date,
        } => {
            let date = parse_when(&date)?;

            // Known friends carry their stored email; anyone else is
            // addressed by the email given and the backend decides.
            let mut directory = FriendshipDirectory::new(client, bus);
            let friends = match directory.refresh(&session).await {
                Ok(snapshot) => snapshot.friends.clone(),
                Err(err) => {
                    tracing::warn!("could not load friends before fan-out: {}", err);
                    Vec::new()
                }
            };
            let recipients: Vec<User> = to
                .iter()
                .map(|email| {
                    friends
                        .iter()
                        .find(|f| f.email.as_deref() == Some(email.as_str()))
                        .cloned()
                        .unwrap_or_else(|| User {
                            id: String::new(),
                            name: None,
                            email: Some(email.clone()),
                        })
                })
                .collect();

            let draft = EventDraft::new(&title, &description, date);
            let result = coordinator.propose(&session, &recipients, &draft).await?;
            print_fan_out(&result);
        }
        HangoutCommand::Inbox {} => {
            let proposals = coordinator.list_received(&session).await?;
            if proposals.is_empty() {
                println!("No proposals.");
            }
            for proposal in proposals {
                let from = proposal
                    .from
                    .as_ref()
                    .map(|u| u.label().to_string())
                    .or(proposal.from_user_id.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{}  {}  from {}  at {}  [{}]",
                    proposal.id,
                    proposal.event_data.title,
                    from,
                    proposal.event_data.date.to_rfc3339(),
                    proposal.status.as_str()
                );
            }
        }
        HangoutCommand::Accept { id } => {
            let outcome = coordinator.respond(&session, &id, true).await?;
            println!(
                "Accepted. {} calendar entr(ies) created.",
                outcome.events.len()
            );
            for warning in &outcome.warnings {
                println!("  Warning: {}", warning);
            }
        }
        HangoutCommand::Decline { id } => {
            coordinator.respond(&session, &id, false).await?;
            println!("Declined.");
        }
    }

    Ok(())
}
