//! Reconciliation between locally drafted events and the backend's
//! authoritative list.
//!
//! The backend owns anything with an id: on a merge the remote copy wins and
//! the local duplicate is dropped. Id-less drafts belong to the local session
//! and survive every merge until the user deletes them.

use std::collections::HashSet;

use crate::backend::client::BackendClient;
use crate::core::SessionContext;

use super::event::{CalendarEvent, EventKey};

/// Merge local entries with a remote batch. Remote wins on id collision,
/// unmatched locals are preserved unchanged, and the result never holds two
/// entries with the same key. Idempotent: merging the result with the same
/// remote batch again changes nothing.
pub fn merge(local: &[CalendarEvent], remote: &[CalendarEvent]) -> Vec<CalendarEvent> {
    let remote_ids: HashSet<&str> = remote
        .iter()
        .filter_map(|e| e.id.as_deref())
        .filter(|id| !id.is_empty())
        .collect();

    let mut seen: HashSet<EventKey> = HashSet::new();
    let mut out: Vec<CalendarEvent> = Vec::with_capacity(local.len() + remote.len());

    for event in local {
        if let Some(id) = event.id.as_deref()
            && remote_ids.contains(id)
        {
            // Superseded by the authoritative copy below
            continue;
        }
        if seen.insert(event.key()) {
            out.push(event.clone());
        }
    }

    for event in remote {
        if seen.insert(event.key()) {
            out.push(event.clone());
        }
    }

    out
}

/// Replace every previously known remote-sourced event with a fresh batch,
/// keeping local-only drafts untouched. Used after any mutating action; the
/// backend is the source of truth for anything with an id, so this is a full
/// replace rather than an incremental patch.
pub fn apply_remote_batch(
    existing: &[CalendarEvent],
    fresh: &[CalendarEvent],
) -> Vec<CalendarEvent> {
    let drafts: Vec<CalendarEvent> = existing
        .iter()
        .filter(|e| matches!(e.key(), EventKey::Structural { .. }))
        .cloned()
        .collect();
    merge(&drafts, fresh)
}

/// Optimistically remove `target` from the displayed set, then issue a
/// best-effort backend delete when the event has an id. A failed backend
/// delete is logged and swallowed; the local view and the backend may
/// diverge until the next full reload. That gap is deliberate (latency over
/// consistency), not an oversight.
pub async fn delete(
    client: &BackendClient,
    session: &SessionContext,
    set: &[CalendarEvent],
    target: &CalendarEvent,
) -> Vec<CalendarEvent> {
    let key = target.key();
    let remaining: Vec<CalendarEvent> = set.iter().filter(|e| e.key() != key).cloned().collect();

    if let Some(id) = target.id.as_deref().filter(|id| !id.is_empty())
        && let Err(err) = client.delete_note(session, id).await
    {
        tracing::warn!("best-effort delete of note {} failed: {}", id, err);
    }

    remaining
}
