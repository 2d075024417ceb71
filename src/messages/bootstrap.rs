use serde::{Deserialize, Serialize};

use crate::id::NodeInfo;

/// Sent over UDP multicast by a joining node looking for any existing
/// member to bootstrap against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapDiscover {
    pub discoverer: NodeInfo,
}

/// Answer to `BootstrapDiscover`, naming a node the discoverer should send
/// its `Join` to (not necessarily the responder itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapResponse {
    pub entry_point: NodeInfo,
}
