use serde::{Deserialize, Serialize};

/// How a neighbor relates to the local node's position in the tree.
///
/// Grounded on `original_source/minhton/include/minhton/core/constants.h`'s
/// `NeighborRelationship` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeighborRelationship {
    Parent,
    Child,
    AdjacentLeft,
    AdjacentRight,
    RoutingTableNeighbor,
    RoutingTableNeighborChild,
    Unknown,
}
