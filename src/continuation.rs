use std::collections::HashMap;

use crate::id::NodeInfo;
use crate::neighbor::NeighborRelationship;
use crate::timeout::TimeoutType;

/// What the event loop should do once a response bearing a given
/// `ref_event_id` arrives, or once the armed timeout fires first.
///
/// Grounded on SPEC_FULL.md §4.2.1: this is the explicit, non-blocking
/// stand-in for the original C++ implementation's "send then wait" calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationKind {
    AwaitingBootstrapResponse,
    AwaitingJoinAccept,
    AwaitingJoinAcceptAck,
    AwaitingReplacementOffer,
    AwaitingReplacementAck,
    /// Tracks the lock-handoff quorum during a replacement: `locked` is the
    /// neighbor set a `LockNeighborRequest` went out to, so the handoff can
    /// broadcast `ReplacementUpdate`/`UnlockNeighbor` to exactly that set
    /// once every grant is back.
    AwaitingNeighborAck {
        remaining: u32,
        locked: Vec<(NeighborRelationship, NodeInfo)>,
    },
    AwaitingDsnAggregation,
    AwaitingInquiryAggregation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingContinuation {
    pub kind: ContinuationKind,
    pub armed_timeout: TimeoutType,
}

/// Table of outstanding suspensions, keyed by the `event_id` the original
/// request was sent with.
#[derive(Debug, Default)]
pub struct ContinuationTable {
    pending: HashMap<u64, PendingContinuation>,
}

impl ContinuationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, event_id: u64, kind: ContinuationKind, armed_timeout: TimeoutType) {
        self.pending.insert(
            event_id,
            PendingContinuation {
                kind,
                armed_timeout,
            },
        );
    }

    /// Resolves and removes the continuation for `ref_event_id`, if any is
    /// still outstanding. A response with no matching entry is a late
    /// duplicate and is silently dropped by the caller rather than raising
    /// `FsmViolation`.
    pub fn resolve(&mut self, ref_event_id: u64) -> Option<PendingContinuation> {
        self.pending.remove(&ref_event_id)
    }

    pub fn cancel(&mut self, event_id: u64) -> Option<PendingContinuation> {
        self.pending.remove(&event_id)
    }

    pub fn is_pending(&self, event_id: u64) -> bool {
        self.pending.contains_key(&event_id)
    }

    /// Decrements the ack quorum counter for an `AwaitingNeighborAck`
    /// continuation in place; returns the locked neighbor set once the
    /// quorum is satisfied, `None` otherwise (including for any other kind).
    pub fn ack_received(&mut self, event_id: u64) -> Option<Vec<(NeighborRelationship, NodeInfo)>> {
        if let Some(entry) = self.pending.get_mut(&event_id) {
            if let ContinuationKind::AwaitingNeighborAck { remaining, .. } = &mut entry.kind {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    let removed = self.pending.remove(&event_id).expect("just matched above");
                    if let ContinuationKind::AwaitingNeighborAck { locked, .. } = removed.kind {
                        return Some(locked);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_removes_the_entry() {
        let mut table = ContinuationTable::new();
        table.register(
            7,
            ContinuationKind::AwaitingJoinAccept,
            TimeoutType::JoinAcceptResponseTimeout,
        );
        assert!(table.is_pending(7));
        let resolved = table.resolve(7);
        assert!(resolved.is_some());
        assert!(!table.is_pending(7));
    }

    #[test]
    fn late_duplicate_resolves_to_none() {
        let mut table = ContinuationTable::new();
        assert!(table.resolve(99).is_none());
    }

    #[test]
    fn ack_quorum_only_fires_once_exhausted() {
        let mut table = ContinuationTable::new();
        table.register(
            1,
            ContinuationKind::AwaitingNeighborAck {
                remaining: 2,
                locked: Vec::new(),
            },
            TimeoutType::ReplacementAckResponseTimeout,
        );
        assert!(table.ack_received(1).is_none());
        assert!(table.ack_received(1).is_some());
        assert!(!table.is_pending(1));
    }
}
