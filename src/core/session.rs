//! Who is acting, made explicit.
//!
//! The session is threaded as a parameter through every directory and
//! coordinator call so that "unauthenticated" is a checkable precondition
//! rather than a side effect discovered halfway through a request. Several
//! backend read endpoints accept anonymous access, which is why the fields
//! are optional instead of the context being absent entirely.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

use super::error::{HuddleError, HuddleResult};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub customer_id: Option<String>,
    pub access_token: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(customer_id: &str, access_token: Option<&str>) -> Self {
        Self {
            customer_id: Some(customer_id.to_string()),
            access_token: access_token.map(|t| t.to_string()),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.customer_id.is_some() || self.access_token.is_some()
    }

    /// The acting user's id, or `Unauthenticated` for operations that
    /// require one.
    pub fn require_user(&self) -> HuddleResult<&str> {
        self.customer_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(HuddleError::Unauthenticated)
    }

    pub fn load(path: &str) -> Option<Self> {
        let raw = fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn save(&self, path: &str) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
