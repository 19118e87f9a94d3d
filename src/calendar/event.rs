//! Calendar events and their identity rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::types::NoteDto;

pub const DEFAULT_COLOR: &str = "#18181B";
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

/// A displayed calendar entry. `id` is present exactly when the event is
/// backend-confirmed; locally drafted events have no id until (unless) the
/// backend accepts them on a later reload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub color: String,
    pub text_color: String,
}

/// Identity of an event for reconciliation: the backend id when one exists,
/// otherwise the structural tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    Id(String),
    Structural {
        title: String,
        description: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl CalendarEvent {
    /// A locally drafted, not-yet-persisted event. One hour long, default
    /// colors, no id.
    pub fn draft(title: &str, description: &str, start: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            description: description.to_string(),
            start,
            end: start + Duration::hours(1),
            color: DEFAULT_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
        }
    }

    /// A backend-confirmed event with a known id.
    pub fn confirmed(id: &str, title: &str, description: &str, start: DateTime<Utc>) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::draft(title, description, start)
        }
    }

    pub fn key(&self) -> EventKey {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => EventKey::Id(id.to_string()),
            _ => EventKey::Structural {
                title: self.title.clone(),
                description: self.description.clone(),
                start: self.start,
                end: self.end,
            },
        }
    }

    /// Map a backend note onto a calendar event. Notes only carry a single
    /// timestamp; the displayed slot is one hour from it. Notes with a
    /// missing or unparseable date are dropped.
    pub fn from_note(note: &NoteDto) -> Option<Self> {
        let raw = note.date.as_deref()?;
        let start = DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Utc);
        let mut event = Self::draft(
            note.title.as_deref().unwrap_or("Event"),
            note.description.as_deref().unwrap_or(""),
            start,
        );
        event.id = note.id.clone().filter(|id| !id.is_empty());
        Some(event)
    }
}
