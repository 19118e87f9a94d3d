//! Hangout proposal fan-out and response handling.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::backend::types::{ProposalStatus, User};
use crate::backend::BackendClient;
use crate::calendar::CalendarEvent;
use crate::core::{HuddleError, HuddleResult, SessionContext};
use crate::notify::{Refresh, RefreshBus};

use super::oracle::{Availability, AvailabilityOracle};
use super::{EventDraft, EventProposal};

/// Attempts at materializing one calendar entry after an accept before the
/// shortfall is reported instead.
const MATERIALIZE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NoEmailOnFile,
    UserNotFound,
    Network,
    RequestFailed(u16),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoEmailOnFile => write!(f, "no email on file"),
            FailureReason::UserNotFound => write!(f, "no account matches that email"),
            FailureReason::Network => write!(f, "could not reach the backend"),
            FailureReason::RequestFailed(status) => write!(f, "request failed ({})", status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecipientFailure {
    pub recipient: String,
    pub reason: FailureReason,
}

/// A heads-up attached to an otherwise successful proposal: the recipient
/// looks busy at the chosen time. Includes a candidate alternative slot.
#[derive(Debug, Clone)]
pub struct Advisory {
    pub recipient: String,
    pub message: String,
    pub suggested: Option<chrono::DateTime<chrono::Utc>>,
}

/// Per-recipient accounting for one fan-out. One recipient failing never
/// aborts the others.
#[derive(Debug, Default)]
pub struct FanOutResult {
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<RecipientFailure>,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug)]
pub struct RespondOutcome {
    pub status: ProposalStatus,
    pub events: Vec<CalendarEvent>,
    /// Accepted proposals should land on both calendars; anything that kept
    /// an entry from being written is reported here rather than swallowed.
    pub warnings: Vec<String>,
}

enum RecipientOutcome {
    Sent(Option<Advisory>),
    Failed(RecipientFailure),
}

pub struct EventProposalCoordinator {
    client: BackendClient,
    oracle: Arc<dyn AvailabilityOracle>,
    bus: RefreshBus,
}

impl EventProposalCoordinator {
    pub fn new(client: BackendClient, oracle: Arc<dyn AvailabilityOracle>, bus: RefreshBus) -> Self {
        Self {
            client,
            oracle,
            bus,
        }
    }

    /// Propose a hangout to each recipient. Every recipient gets an
    /// independent proposal; the result tallies who it reached.
    pub async fn propose(
        &self,
        session: &SessionContext,
        recipients: &[User],
        draft: &EventDraft,
    ) -> HuddleResult<FanOutResult> {
        session.require_user()?;
        draft.validate()?;
        if recipients.is_empty() {
            return Err(HuddleError::Validation(
                "pick at least one friend to invite".to_string(),
            ));
        }

        let attempts = recipients
            .iter()
            .map(|recipient| self.propose_one(session, recipient, draft));
        let outcomes = join_all(attempts).await;

        let mut result = FanOutResult::default();
        for outcome in outcomes {
            match outcome {
                RecipientOutcome::Sent(advisory) => {
                    result.success_count += 1;
                    if let Some(advisory) = advisory {
                        result.advisories.push(advisory);
                    }
                }
                RecipientOutcome::Failed(failure) => {
                    result.failed_count += 1;
                    result.errors.push(failure);
                }
            }
        }
        info!(
            sent = result.success_count,
            failed = result.failed_count,
            "hangout fan-out finished"
        );
        if result.success_count > 0 {
            self.bus.publish(Refresh::Proposals);
        }
        Ok(result)
    }

    async fn propose_one(
        &self,
        session: &SessionContext,
        recipient: &User,
        draft: &EventDraft,
    ) -> RecipientOutcome {
        let email = match recipient.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email,
            _ => {
                return RecipientOutcome::Failed(RecipientFailure {
                    recipient: recipient.label().to_string(),
                    reason: FailureReason::NoEmailOnFile,
                });
            }
        };

        // Pre-send availability check. Advisory only; a busy recipient
        // still gets the proposal and decides for themselves.
        let mut advisory = match self.oracle.is_free(email, draft.date).await {
            Ok(availability) => self.advise(email, draft, &availability),
            Err(err) => {
                warn!("availability check for {} failed: {}", email, err);
                None
            }
        };

        match self
            .client
            .send_event_request(session, email, &draft.title, &draft.description, draft.date)
            .await
        {
            Ok(response) => {
                if advisory.is_none()
                    && let Some(dto) = &response.availability
                {
                    advisory = self.advise(email, draft, &Availability::from(dto));
                }
                RecipientOutcome::Sent(advisory)
            }
            Err(HuddleError::NotFound(_)) => RecipientOutcome::Failed(RecipientFailure {
                recipient: email.to_string(),
                reason: FailureReason::UserNotFound,
            }),
            Err(HuddleError::Backend { status, message }) => {
                warn!("proposal to {} rejected ({}): {}", email, status, message);
                RecipientOutcome::Failed(RecipientFailure {
                    recipient: email.to_string(),
                    reason: FailureReason::RequestFailed(status),
                })
            }
            Err(HuddleError::Unauthenticated) => RecipientOutcome::Failed(RecipientFailure {
                recipient: email.to_string(),
                reason: FailureReason::RequestFailed(401),
            }),
            Err(err) => {
                warn!("proposal to {} failed: {}", email, err);
                RecipientOutcome::Failed(RecipientFailure {
                    recipient: email.to_string(),
                    reason: FailureReason::Network,
                })
            }
        }
    }

    fn advise(
        &self,
        email: &str,
        draft: &EventDraft,
        availability: &Availability,
    ) -> Option<Advisory> {
        if availability.is_available {
            return None;
        }
        Some(Advisory {
            recipient: email.to_string(),
            message: availability
                .message
                .clone()
                .unwrap_or_else(|| format!("{} looks busy at that time", email)),
            suggested: Some(draft.date + Duration::days(1)),
        })
    }

    /// Accept or decline a received proposal. Accepting materializes the
    /// event on both calendars: one entry owned by the responder, one by
    /// the sender.
    pub async fn respond(
        &self,
        session: &SessionContext,
        request_id: &str,
        accept: bool,
    ) -> HuddleResult<RespondOutcome> {
        let me = session.require_user()?.to_string();
        if request_id.trim().is_empty() {
            return Err(HuddleError::Validation("request id is required".to_string()));
        }

        // The respond endpoint does not echo the event back, so fetch the
        // proposal first. Doubles as an idempotency check.
        let received = self.client.list_event_requests_received(session).await?;
        let dto = received
            .into_iter()
            .find(|proposal| proposal.id == request_id)
            .ok_or_else(|| HuddleError::NotFound("no such event request".to_string()))?;
        if dto.status.is_resolved() {
            return Err(HuddleError::AlreadyResolved);
        }
        let sender_id = dto.from_user_id.clone();
        let proposal = EventProposal::from_dto(dto);

        self.client
            .respond_event_request(session, request_id, accept)
            .await
            .map_err(|err| match err {
                HuddleError::Backend {
                    status: 409 | 410, ..
                } => HuddleError::AlreadyResolved,
                other => other,
            })?;
        self.bus.publish(Refresh::Proposals);

        if !accept {
            return Ok(RespondOutcome {
                status: ProposalStatus::Declined,
                events: Vec::new(),
                warnings: Vec::new(),
            });
        }

        let mut events = Vec::new();
        let mut warnings = Vec::new();
        match proposal {
            Some(proposal) => {
                let mut owners = vec![me];
                match sender_id {
                    Some(sender) => owners.push(sender),
                    None => warnings.push(
                        "the proposal did not identify its sender; their calendar entry was skipped"
                            .to_string(),
                    ),
                }
                for owner in owners {
                    match self.materialize(session, &owner, &proposal.event_data).await {
                        Ok(event) => events.push(event),
                        Err(err) => {
                            error!("calendar entry for {} was not created: {}", owner, err);
                            warnings
                                .push(format!("calendar entry for {} was not created: {}", owner, err));
                        }
                    }
                }
            }
            None => warnings
                .push("the proposal carried no usable date; no calendar entries were created".to_string()),
        }

        self.bus.publish(Refresh::Calendar);
        Ok(RespondOutcome {
            status: ProposalStatus::Accepted,
            events,
            warnings,
        })
    }

    async fn materialize(
        &self,
        session: &SessionContext,
        owner_id: &str,
        draft: &EventDraft,
    ) -> HuddleResult<CalendarEvent> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .client
                .create_note(session, owner_id, &draft.title, &draft.description, draft.date)
                .await
            {
                Ok(note_id) => {
                    let mut event = CalendarEvent::draft(&draft.title, &draft.description, draft.date);
                    event.id = note_id;
                    return Ok(event);
                }
                // Only transport and backend hiccups are worth retrying;
                // auth and validation failures repeat identically.
                Err(err @ (HuddleError::Network(_) | HuddleError::Backend { .. }))
                    if attempt < MATERIALIZE_ATTEMPTS =>
                {
                    warn!(
                        "note create for {} failed (attempt {}): {}",
                        owner_id, attempt, err
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Proposals waiting on the signed-in user, newest first as the backend
    /// returns them. Malformed entries are dropped.
    pub async fn list_received(
        &self,
        session: &SessionContext,
    ) -> HuddleResult<Vec<EventProposal>> {
        let received = self.client.list_event_requests_received(session).await?;
        Ok(received
            .into_iter()
            .filter_map(EventProposal::from_dto)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use mockito::Matcher;
    use serde_json::json;

    fn session() -> SessionContext {
        SessionContext::signed_in("42", Some("tok"))
    }

    fn user(id: &str, email: Option<&str>) -> User {
        User {
            id: id.to_string(),
            name: Some(format!("user-{}", id)),
            email: email.map(|e| e.to_string()),
        }
    }

    fn draft() -> EventDraft {
        let date = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
        EventDraft::new("Pizza night", "bring board games", date)
    }

    fn coordinator(server: &mockito::Server) -> EventProposalCoordinator {
        EventProposalCoordinator::new(
            BackendClient::new(&server.url()),
            Arc::new(crate::hangouts::AlwaysFree),
            RefreshBus::new(),
        )
    }

    struct AlwaysBusy;

    #[async_trait]
    impl AvailabilityOracle for AlwaysBusy {
        async fn is_free(
            &self,
            _email: &str,
            _date: DateTime<Utc>,
        ) -> HuddleResult<Availability> {
            Ok(Availability::busy(Some("packed schedule".to_string())))
        }
    }

    #[tokio::test]
    async fn test_fan_out_counts_missing_email_as_failure() {
        let mut server = mockito::Server::new_async().await;
        let sent = server
            .mock("POST", "/friendship/request-event/42")
            .with_status(200)
            .with_body(r#"{"availability": {"isAvailable": true}}"#)
            .expect(2)
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let recipients = vec![
            user("1", Some("ana@x.io")),
            user("2", Some("bo@x.io")),
            user("3", None),
        ];
        let result = coordinator
            .propose(&session(), &recipients, &draft())
            .await
            .unwrap();

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].recipient, "user-3");
        assert_eq!(result.errors[0].reason, FailureReason::NoEmailOnFile);
        assert!(result.advisories.is_empty());
        sent.assert_async().await;
    }

    #[tokio::test]
    async fn test_fan_out_keeps_going_past_per_recipient_errors() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("POST", "/friendship/request-event/42")
            .match_body(Matcher::PartialJson(json!({"email": "ghost@x.io"})))
            .with_status(404)
            .with_body(r#"{"message": "no such user"}"#)
            .create_async()
            .await;
        let _broken = server
            .mock("POST", "/friendship/request-event/42")
            .match_body(Matcher::PartialJson(json!({"email": "bo@x.io"})))
            .with_status(500)
            .with_body("{}")
            .create_async()
            .await;
        let _ok = server
            .mock("POST", "/friendship/request-event/42")
            .match_body(Matcher::PartialJson(json!({"email": "ana@x.io"})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let recipients = vec![
            user("1", Some("ghost@x.io")),
            user("2", Some("bo@x.io")),
            user("3", Some("ana@x.io")),
        ];
        let result = coordinator
            .propose(&session(), &recipients, &draft())
            .await
            .unwrap();

        assert_eq!(result.success_count, 1);
        assert_eq!(result.failed_count, 2);
        let reasons: Vec<_> = result.errors.iter().map(|e| e.reason.clone()).collect();
        assert!(reasons.contains(&FailureReason::UserNotFound));
        assert!(reasons.contains(&FailureReason::RequestFailed(500)));
    }

    #[tokio::test]
    async fn test_busy_recipient_is_an_advisory_not_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let _sent = server
            .mock("POST", "/friendship/request-event/42")
            .with_status(200)
            .with_body(
                r#"{"availability": {"isAvailable": false, "message": "Ana is busy then"}}"#,
            )
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let recipients = vec![user("1", Some("ana@x.io"))];
        let result = coordinator
            .propose(&session(), &recipients, &draft())
            .await
            .unwrap();

        assert_eq!(result.success_count, 1);
        assert_eq!(result.failed_count, 0);
        assert_eq!(result.advisories.len(), 1);
        assert_eq!(result.advisories[0].message, "Ana is busy then");
        assert_eq!(
            result.advisories[0].suggested,
            Some(draft().date + Duration::days(1))
        );
    }

    #[tokio::test]
    async fn test_oracle_verdict_raises_advisory_before_send() {
        let mut server = mockito::Server::new_async().await;
        let sent = server
            .mock("POST", "/friendship/request-event/42")
            .with_status(200)
            .with_body(r#"{"availability": {"isAvailable": true}}"#)
            .create_async()
            .await;

        let coordinator = EventProposalCoordinator::new(
            BackendClient::new(&server.url()),
            Arc::new(AlwaysBusy),
            RefreshBus::new(),
        );
        let recipients = vec![user("1", Some("ana@x.io"))];
        let result = coordinator
            .propose(&session(), &recipients, &draft())
            .await
            .unwrap();

        // Still sent; the verdict only annotates the result
        assert_eq!(result.success_count, 1);
        assert_eq!(result.advisories.len(), 1);
        assert_eq!(result.advisories[0].message, "packed schedule");
        sent.assert_async().await;
    }

    #[tokio::test]
    async fn test_propose_validates_before_any_network_call() {
        let server = mockito::Server::new_async().await;
        let coordinator = coordinator(&server);

        let err = coordinator
            .propose(&session(), &[], &draft())
            .await
            .unwrap_err();
        assert!(matches!(err, HuddleError::Validation(_)));

        let mut empty_title = draft();
        empty_title.title = " ".to_string();
        let err = coordinator
            .propose(&session(), &[user("1", Some("a@x.io"))], &empty_title)
            .await
            .unwrap_err();
        assert!(matches!(err, HuddleError::Validation(_)));
    }

    fn received_body(status: &str) -> String {
        json!([{
            "id": "e1",
            "fromUserId": 9,
            "toUserId": 42,
            "title": "Pizza night",
            "description": "bring board games",
            "date": "2025-06-01T18:00:00Z",
            "status": status,
        }])
        .to_string()
    }

    #[tokio::test]
    async fn test_accept_materializes_an_entry_per_participant() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body(received_body("pending"))
            .create_async()
            .await;
        let _respond = server
            .mock("POST", "/friendship/respond-event/42")
            .match_body(Matcher::PartialJson(json!({"requestId": "e1", "accept": true})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let notes = server
            .mock("POST", "/note")
            .with_status(201)
            .with_body(r#"{"id": 100}"#)
            .expect(2)
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let outcome = coordinator.respond(&session(), "e1", true).await.unwrap();

        assert_eq!(outcome.status, ProposalStatus::Accepted);
        assert_eq!(outcome.events.len(), 2);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.events[0].title, "Pizza night");
        notes.assert_async().await;
    }

    #[tokio::test]
    async fn test_decline_creates_no_calendar_entries() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body(received_body("pending"))
            .create_async()
            .await;
        let _respond = server
            .mock("POST", "/friendship/respond-event/42")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let notes = server
            .mock("POST", "/note")
            .expect(0)
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let outcome = coordinator.respond(&session(), "e1", false).await.unwrap();

        assert_eq!(outcome.status, ProposalStatus::Declined);
        assert!(outcome.events.is_empty());
        notes.assert_async().await;
    }

    #[tokio::test]
    async fn test_responding_twice_is_already_resolved() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body(received_body("accepted"))
            .create_async()
            .await;
        let respond = server
            .mock("POST", "/friendship/respond-event/42")
            .expect(0)
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let err = coordinator.respond(&session(), "e1", true).await.unwrap_err();
        assert!(matches!(err, HuddleError::AlreadyResolved));
        respond.assert_async().await;
    }

    #[tokio::test]
    async fn test_backend_conflict_on_respond_maps_to_already_resolved() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body(received_body("pending"))
            .create_async()
            .await;
        let _respond = server
            .mock("POST", "/friendship/respond-event/42")
            .with_status(409)
            .with_body(r#"{"message": "already handled"}"#)
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let err = coordinator.respond(&session(), "e1", true).await.unwrap_err();
        assert!(matches!(err, HuddleError::AlreadyResolved));
    }

    #[tokio::test]
    async fn test_respond_to_unknown_id_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let err = coordinator.respond(&session(), "nope", true).await.unwrap_err();
        assert!(matches!(err, HuddleError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_materialization_shortfall_is_reported_not_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body(received_body("pending"))
            .create_async()
            .await;
        let _respond = server
            .mock("POST", "/friendship/respond-event/42")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        // Three attempts per participant before giving up
        let notes = server
            .mock("POST", "/note")
            .with_status(500)
            .with_body("{}")
            .expect(6)
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let outcome = coordinator.respond(&session(), "e1", true).await.unwrap();

        assert_eq!(outcome.status, ProposalStatus::Accepted);
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.warnings.len(), 2);
        notes.assert_async().await;
    }

    #[tokio::test]
    async fn test_materialization_gives_up_at_once_on_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body(received_body("pending"))
            .create_async()
            .await;
        let _respond = server
            .mock("POST", "/friendship/respond-event/42")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        // One attempt per participant, no retries: a 401 cannot heal itself
        let notes = server
            .mock("POST", "/note")
            .with_status(401)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let outcome = coordinator.respond(&session(), "e1", true).await.unwrap();

        assert_eq!(outcome.status, ProposalStatus::Accepted);
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.warnings.len(), 2);
        notes.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_received_drops_malformed_proposals() {
        let mut server = mockito::Server::new_async().await;
        let _received = server
            .mock("GET", "/friendship/event-requests/42/received")
            .with_status(200)
            .with_body(
                json!([
                    {"id": "e1", "title": "Pizza", "date": "2025-06-01T18:00:00Z", "status": "pending"},
                    {"id": "e2", "title": "No date", "status": "pending"},
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let proposals = coordinator.list_received(&session()).await.unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].id, "e1");
    }
}
