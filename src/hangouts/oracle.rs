//! Advisory availability checks.
//!
//! The oracle is an external collaborator: this crate consumes the
//! interface and never implements real scheduling logic. A busy verdict
//! informs the sender; it never gates a proposal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::backend::types::AvailabilityDto;
use crate::core::HuddleResult;

#[derive(Debug, Clone)]
pub struct Availability {
    pub is_available: bool,
    pub message: Option<String>,
}

impl Availability {
    pub fn free() -> Self {
        Self {
            is_available: true,
            message: None,
        }
    }

    pub fn busy(message: Option<String>) -> Self {
        Self {
            is_available: false,
            message,
        }
    }
}

impl From<&AvailabilityDto> for Availability {
    fn from(dto: &AvailabilityDto) -> Self {
        Self {
            is_available: dto.is_available,
            message: dto.message.clone(),
        }
    }
}

#[async_trait]
pub trait AvailabilityOracle: Send + Sync {
    async fn is_free(&self, email: &str, date: DateTime<Utc>) -> HuddleResult<Availability>;
}

/// Default wiring: no pre-check of its own, leaving the backend's verdict
/// (returned with each created proposal) as the only advisory source.
pub struct AlwaysFree;

#[async_trait]
impl AvailabilityOracle for AlwaysFree {
    async fn is_free(&self, _email: &str, _date: DateTime<Utc>) -> HuddleResult<Availability> {
        Ok(Availability::free())
    }
}
