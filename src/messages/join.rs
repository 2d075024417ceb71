use serde::{Deserialize, Serialize};

use crate::id::NodeInfo;
use crate::position::LogicalPosition;

/// Request to attach under `entry_point`, which will place the joiner at
/// the first free position it finds below itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Join {
    pub joiner: NodeInfo,
}

/// Accepts the join, telling the joiner the position it now occupies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinAccept {
    pub assigned_position: LogicalPosition,
    pub parent: NodeInfo,
    pub adjacent_left: Option<NodeInfo>,
    pub adjacent_right: Option<NodeInfo>,
}

/// Joiner's acknowledgement back to its new parent, completing the
/// three-way handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinAcceptAck {
    pub joiner: NodeInfo,
}

/// Sent back instead of `JoinAccept` when the entry point can no longer
/// place the joiner (e.g. a concurrent join already took the free slot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRejectDueToMismatch {
    pub reason: String,
}
