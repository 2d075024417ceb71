use serde::{Deserialize, Serialize};

use crate::id::NodeInfo;
use crate::neighbor::NeighborRelationship;

/// Pushes an updated `NodeInfo` for one or more neighbor relationships.
///
/// Grounded on `original_source/minhton/include/minhton/algorithms/misc/response_algorithm_general.h`'s
/// `processUpdateNeighbors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNeighbors {
    pub updates: Vec<(NeighborRelationship, NodeInfo)>,
}

/// Asks the recipient to forget a neighbor at the given relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveNeighbor {
    pub relationship: NeighborRelationship,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveNeighborAck;

/// Combines a removal with replacement updates in one round trip —
/// `processRemoveAndUpdateNeighbors` in the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveAndUpdateNeighbor {
    pub remove: NeighborRelationship,
    pub updates: Vec<(NeighborRelationship, NodeInfo)>,
}

/// Requests the sender's current view of a set of relationships —
/// `processGetNeighbors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNeighbors {
    pub send_back_to: NodeInfo,
    pub relationships: Vec<NeighborRelationship>,
}

/// Answer to `GetNeighbors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InformAboutNeighbors {
    pub neighbors: Vec<(NeighborRelationship, NodeInfo)>,
}
