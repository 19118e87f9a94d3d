pub mod coordinator;
pub mod oracle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::types::{EventRequestDto, ProposalStatus, User};
use crate::core::{HuddleError, HuddleResult};

pub use coordinator::{
    Advisory, EventProposalCoordinator, FailureReason, FanOutResult, RecipientFailure,
    RespondOutcome,
};
pub use oracle::{AlwaysFree, Availability, AvailabilityOracle};

/// What a hangout proposal offers: the event fields shared by every
/// recipient of a fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl EventDraft {
    pub fn new(title: &str, description: &str, date: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            date,
        }
    }

    pub fn validate(&self) -> HuddleResult<()> {
        if self.title.trim().is_empty() {
            return Err(HuddleError::Validation("title is required".to_string()));
        }
        Ok(())
    }
}

/// A hangout proposal addressed to exactly one recipient. Inviting N
/// friends yields N of these, each with its own lifecycle; there is no
/// shared "event" before acceptance.
#[derive(Debug, Clone)]
pub struct EventProposal {
    pub id: String,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub event_data: EventDraft,
    pub status: ProposalStatus,
    pub created_at: Option<DateTime<Utc>>,
    /// Counterparty summary when the backend attaches one.
    pub from: Option<User>,
}

impl EventProposal {
    /// Build from the wire shape. Proposals with no id or no usable date
    /// cannot be acted on and are dropped from listings.
    pub fn from_dto(dto: EventRequestDto) -> Option<Self> {
        if dto.id.is_empty() {
            return None;
        }
        let date = DateTime::parse_from_rfc3339(dto.date.as_deref()?)
            .ok()?
            .with_timezone(&Utc);
        let created_at = dto
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Some(Self {
            id: dto.id,
            from_user_id: dto.from_user_id,
            to_user_id: dto.to_user_id,
            event_data: EventDraft {
                title: dto.title.unwrap_or_else(|| "Event".to_string()),
                description: dto.description.unwrap_or_default(),
                date,
            },
            status: dto.status,
            created_at,
            from: dto.user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(id: &str, date: Option<&str>) -> EventRequestDto {
        EventRequestDto {
            id: id.to_string(),
            from_user_id: Some("9".to_string()),
            to_user_id: Some("42".to_string()),
            title: Some("Pizza night".to_string()),
            description: None,
            date: date.map(|s| s.to_string()),
            status: ProposalStatus::Pending,
            created_at: Some("2025-05-30T09:00:00Z".to_string()),
            user: None,
        }
    }

    #[test]
    fn test_from_dto_requires_id_and_date() {
        let ok = EventProposal::from_dto(dto("e1", Some("2025-06-01T18:00:00Z"))).unwrap();
        assert_eq!(ok.event_data.title, "Pizza night");
        assert_eq!(ok.event_data.description, "");
        assert!(ok.created_at.is_some());

        assert!(EventProposal::from_dto(dto("", Some("2025-06-01T18:00:00Z"))).is_none());
        assert!(EventProposal::from_dto(dto("e1", None)).is_none());
        assert!(EventProposal::from_dto(dto("e1", Some("garbage"))).is_none());
    }

    #[test]
    fn test_draft_validation() {
        let date = Utc::now();
        assert!(EventDraft::new("Pizza", "", date).validate().is_ok());
        assert!(matches!(
            EventDraft::new("   ", "", date).validate(),
            Err(HuddleError::Validation(_))
        ));
    }
}
