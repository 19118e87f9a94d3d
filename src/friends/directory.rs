//! The friend graph and pending friend requests for the signed-in user.
//!
//! The directory caches one snapshot of the friend/request lists. Any
//! mutating call drops the snapshot and publishes on the refresh bus; it is
//! the caller's job to `refresh` before trusting the lists again. There is
//! no background sync.

use crate::backend::client::{BackendClient, RequestDirection};
use crate::backend::types::{FriendRequest, ProposalStatus, User};
use crate::core::{HuddleError, HuddleResult, SessionContext};
use crate::notify::{Refresh, RefreshBus};

#[derive(Debug, Default, Clone)]
pub struct FriendSnapshot {
    pub friends: Vec<User>,
    pub received: Vec<FriendRequest>,
    pub sent: Vec<FriendRequest>,
}

pub struct FriendshipDirectory {
    client: BackendClient,
    bus: RefreshBus,
    snapshot: Option<FriendSnapshot>,
}

impl FriendshipDirectory {
    pub fn new(client: BackendClient, bus: RefreshBus) -> Self {
        Self {
            client,
            bus,
            snapshot: None,
        }
    }

    /// Resolve a user by email. Creates no relation.
    pub async fn search(&self, session: &SessionContext, email: &str) -> HuddleResult<User> {
        session.require_user()?;
        let email = email.trim();
        if email.is_empty() {
            return Err(HuddleError::Validation("email is required".to_string()));
        }
        match self.client.search_user(session, email).await? {
            Some(user) => Ok(user),
            None => Err(HuddleError::NotFound(
                "no account matches that email".to_string(),
            )),
        }
    }

    /// Send a friend request to the account behind `to_email`. Fails with
    /// `Conflict` when an edge already exists or a request is already
    /// pending in either direction; the cached snapshot is consulted first
    /// so the obvious cases never hit the network.
    pub async fn send_request(
        &mut self,
        session: &SessionContext,
        to_email: &str,
    ) -> HuddleResult<Option<FriendRequest>> {
        session.require_user()?;
        let to_email = to_email.trim();
        if to_email.is_empty() {
            return Err(HuddleError::Validation("email is required".to_string()));
        }

        if let Some(snapshot) = &self.snapshot {
            if snapshot
                .friends
                .iter()
                .any(|f| f.email.as_deref() == Some(to_email))
            {
                return Err(HuddleError::Conflict("already friends".to_string()));
            }
            let pending_with = |requests: &[FriendRequest]| {
                requests.iter().any(|r| {
                    r.status == ProposalStatus::Pending
                        && r.user
                            .as_ref()
                            .is_some_and(|u| u.email.as_deref() == Some(to_email))
                })
            };
            if pending_with(&snapshot.received) || pending_with(&snapshot.sent) {
                return Err(HuddleError::Conflict(
                    "a friend request is already pending".to_string(),
                ));
            }
        }

        let created = self
            .client
            .send_friend_request(session, to_email)
            .await
            .map_err(|err| match err {
                HuddleError::Backend { status: 409, message } => HuddleError::Conflict(message),
                other => other,
            })?;

        self.invalidate();
        Ok(created)
    }

    /// Accept or decline a received friend request. Responding to an
    /// already-resolved request fails with `AlreadyResolved`; the first
    /// response's outcome stands.
    pub async fn respond(
        &mut self,
        session: &SessionContext,
        request_id: &str,
        accept: bool,
    ) -> HuddleResult<()> {
        session.require_user()?;
        if request_id.trim().is_empty() {
            return Err(HuddleError::Validation("request id is required".to_string()));
        }

        // Cheap idempotency guard before the network round trip
        if let Some(snapshot) = &self.snapshot
            && snapshot
                .received
                .iter()
                .any(|r| r.id == request_id && r.status.is_resolved())
        {
            return Err(HuddleError::AlreadyResolved);
        }

        self.client
            .respond_friend_request(session, request_id, accept)
            .await
            .map_err(|err| match err {
                HuddleError::Backend { status: 409 | 410, .. } => HuddleError::AlreadyResolved,
                other => other,
            })?;

        self.invalidate();
        Ok(())
    }

    /// Reload all three lists in parallel, mirroring the original client's
    /// single combined fetch. A list that fails to load comes back empty
    /// rather than failing the whole refresh.
    pub async fn refresh(&mut self, session: &SessionContext) -> HuddleResult<&FriendSnapshot> {
        session.require_user()?;

        let (friends, received, sent) = tokio::join!(
            self.client.list_friends(session),
            self.client
                .list_friend_requests(session, RequestDirection::Received),
            self.client
                .list_friend_requests(session, RequestDirection::Sent),
        );

        let snapshot = FriendSnapshot {
            friends: friends.unwrap_or_else(|err| {
                tracing::warn!("failed to load friends: {}", err);
                Vec::new()
            }),
            received: received.unwrap_or_else(|err| {
                tracing::warn!("failed to load received requests: {}", err);
                Vec::new()
            }),
            sent: sent.unwrap_or_else(|err| {
                tracing::warn!("failed to load sent requests: {}", err);
                Vec::new()
            }),
        };

        Ok(self.snapshot.insert(snapshot))
    }

    pub fn list_friends(&self) -> &[User] {
        self.snapshot.as_ref().map_or(&[], |s| &s.friends)
    }

    pub fn list_received(&self) -> &[FriendRequest] {
        self.snapshot.as_ref().map_or(&[], |s| &s.received)
    }

    pub fn list_sent(&self) -> &[FriendRequest] {
        self.snapshot.as_ref().map_or(&[], |s| &s.sent)
    }

    /// True when the lists must be reloaded before being trusted.
    pub fn is_stale(&self) -> bool {
        self.snapshot.is_none()
    }

    fn invalidate(&mut self) {
        tracing::debug!("friend lists invalidated");
        self.snapshot = None;
        self.bus.publish(Refresh::Friends);
    }
}
