use serde::{Deserialize, Serialize};

use crate::id::NodeInfo;
use crate::neighbor::NeighborRelationship;

/// Sent by a leaving node to find a replacement occupying the deepest,
/// highest-numbered position in its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindReplacement {
    pub leaving: NodeInfo,
}

/// A candidate replacement volunteers itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementOffer {
    pub candidate: NodeInfo,
}

/// The leaver accepts the offer and starts the lock handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementAck {
    pub accepted: NodeInfo,
}

/// The leaver rejects the offer (e.g. a better candidate already locked in).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementNack {
    pub reason: String,
}

/// Tells every neighbor of the vacated position to repoint at the
/// replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementUpdate {
    pub replacement: NodeInfo,
}

/// Requests an exclusive lock on the neighbor slot identified by
/// `relationship`, held while the replacement handoff is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockNeighborRequest {
    pub requester: NodeInfo,
    pub relationship: NeighborRelationship,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockNeighborResponse {
    pub granted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockNeighbor {
    pub relationship: NeighborRelationship,
}

/// Direct-leave-without-replacement: the leaf asks its parent to drop it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignOffParentRequest {
    pub leaving: NodeInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignOffParentAnswer {
    pub acknowledged: bool,
}
