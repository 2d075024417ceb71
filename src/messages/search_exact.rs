use serde::{Deserialize, Serialize};

use crate::id::NodeInfo;
use crate::position::LogicalPosition;

/// Greedily forwarded towards `destination` by tree distance until it
/// reaches the node that owns that position.
///
/// Grounded on `original_source/minhton/include/minhton/message/search_exact.h`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchExact {
    pub destination: LogicalPosition,
    pub query_event_id: u64,
    pub notify_about_failure: bool,
    pub requester: NodeInfo,
}

/// Sent back to `requester` when forwarding could not make progress (e.g.
/// the destination position turned out to be vacant) and
/// `notify_about_failure` was set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchExactFailure {
    pub destination: LogicalPosition,
    pub query_event_id: u64,
}
