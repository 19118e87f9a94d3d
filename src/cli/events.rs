use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use std::fs;

use crate::backend::BackendClient;
use crate::calendar::{self, CalendarEvent};
use crate::core::{AppConfig, SessionContext};

use super::auth;

#[derive(Subcommand)]
pub enum EventsCommand {
    /// Show the calendar: backend events merged with local drafts
    List {},
    /// Add an event
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Start time, RFC 3339 (e.g. 2025-06-01T18:00:00Z)
        #[arg(long)]
        date: String,
    },
    /// Remove an event, by id for confirmed events or by title for drafts
    Delete {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
}

pub(crate) fn parse_when(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("could not parse `{}` as an RFC 3339 time", raw))
}

fn load_drafts(config: &AppConfig) -> Vec<CalendarEvent> {
    fs::read_to_string(&config.drafts_path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn save_drafts(config: &AppConfig, drafts: &[CalendarEvent]) -> Result<()> {
    fs::write(&config.drafts_path, serde_json::to_string_pretty(drafts)?)?;
    Ok(())
}

/// Local drafts merged with the backend's notes. A failed remote fetch
/// degrades to drafts only.
async fn current_set(
    client: &BackendClient,
    session: &SessionContext,
    config: &AppConfig,
) -> Vec<CalendarEvent> {
    let drafts = load_drafts(config);
    let remote = match session.require_user() {
        Ok(user_id) => match client.list_notes(session, user_id).await {
            Ok(notes) => notes
                .iter()
                .filter_map(CalendarEvent::from_note)
                .collect::<Vec<_>>(),
            Err(err) => {
                tracing::warn!("could not load calendar from backend: {}", err);
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    };
    calendar::merge(&drafts, &remote)
}

pub async fn run(command: EventsCommand, config: &AppConfig) -> Result<()> {
    let client = BackendClient::new(&config.api_base_url);
    let session = auth::load_session(config);

    match command {
        EventsCommand::List {} => {
            let events = current_set(&client, &session, config).await;
            if events.is_empty() {
                println!("No events.");
            }
            for event in events {
                let id = event.id.as_deref().unwrap_or("(draft)");
                println!("{}  {}  {}", id, event.start.to_rfc3339(), event.title);
            }
        }
        EventsCommand::Add {
            title,
            description,
            date,
        } => {
            let start = parse_when(&date)?;
            let draft = CalendarEvent::draft(&title, &description, start);

            // Optimistic: the draft is visible immediately, then either
            // handed to the backend or kept local when that fails.
            let mut drafts = load_drafts(config);
            drafts.push(draft.clone());
            save_drafts(config, &drafts)?;

            let user_id = match session.require_user() {
                Ok(id) => id.to_string(),
                Err(_) => {
                    println!("Saved draft locally. Sign in to sync it to the backend.");
                    return Ok(());
                }
            };
            match client
                .create_note(&session, &user_id, &title, &description, start)
                .await
            {
                Ok(id) => {
                    // Confirmed remotely; the draft copy is now redundant
                    drafts.retain(|e| e.key() != draft.key());
                    save_drafts(config, &drafts)?;
                    match id {
                        Some(id) => println!("Event {} created.", id),
                        None => println!("Event created."),
                    }
                }
                Err(err) => {
                    println!("Saved draft locally; backend create failed: {}", err);
                }
            }
        }
        EventsCommand::Delete { id, title } => {
            let set = current_set(&client, &session, config).await;
            let target = set
                .iter()
                .find(|e| match (&id, &title) {
                    (Some(id), _) => e.id.as_deref() == Some(id.as_str()),
                    (None, Some(title)) => e.id.is_none() && e.title == *title,
                    (None, None) => false,
                })
                .cloned()
                .ok_or_else(|| anyhow!("no matching event; pass --id or --title"))?;

            let remaining = calendar::delete(&client, &session, &set, &target).await;
            let drafts: Vec<CalendarEvent> =
                remaining.into_iter().filter(|e| e.id.is_none()).collect();
            save_drafts(config, &drafts)?;
            println!("Event removed.");
        }
    }

    Ok(())
}
