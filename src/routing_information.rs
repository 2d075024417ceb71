use std::collections::HashMap;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::id::NodeInfo;
use crate::neighbor::NeighborRelationship;
use crate::position::LogicalPosition;

/// A participant's view of its own place in the overlay and of every
/// neighbor it currently tracks.
///
/// Grounded on the teacher's `Section` struct (`section/section.rs`): a
/// self-view plus query/update methods over a neighbor set, generalized
/// from "set of elders" to the tree-structured neighbor classes spec.md
/// names (parent, children, adjacents, routing-table neighbors and their
/// children).
#[derive(Debug, Clone)]
pub struct RoutingInformation {
    self_node: NodeInfo,
    parent: Option<NodeInfo>,
    children: HashMap<u8, NodeInfo>,
    adjacent_left: Option<NodeInfo>,
    adjacent_right: Option<NodeInfo>,
    routing_table_neighbors: HashMap<LogicalPosition, NodeInfo>,
    routing_table_neighbor_children: HashMap<LogicalPosition, NodeInfo>,
}

impl RoutingInformation {
    pub fn new(self_node: NodeInfo) -> Self {
        Self {
            self_node,
            parent: None,
            children: HashMap::new(),
            adjacent_left: None,
            adjacent_right: None,
            routing_table_neighbors: HashMap::new(),
            routing_table_neighbor_children: HashMap::new(),
        }
    }

    pub fn self_node(&self) -> &NodeInfo {
        &self.self_node
    }

    pub fn self_position(&self) -> Option<LogicalPosition> {
        self.self_node.position()
    }

    pub fn set_self_position(&mut self, position: LogicalPosition) {
        self.self_node.set_position(position);
    }

    pub fn parent(&self) -> Option<&NodeInfo> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> impl Iterator<Item = &NodeInfo> {
        self.children.values().sorted_by_key(|n| n.position().map(|p| p.number()))
    }

    pub fn child_at(&self, index: u8) -> Option<&NodeInfo> {
        self.children.get(&index)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn adjacent_left(&self) -> Option<&NodeInfo> {
        self.adjacent_left.as_ref()
    }

    pub fn adjacent_right(&self) -> Option<&NodeInfo> {
        self.adjacent_right.as_ref()
    }

    pub fn set_parent(&mut self, node: Option<NodeInfo>) {
        self.parent = node;
    }

    pub fn set_adjacent_left(&mut self, node: Option<NodeInfo>) {
        self.adjacent_left = node;
    }

    pub fn set_adjacent_right(&mut self, node: Option<NodeInfo>) {
        self.adjacent_right = node;
    }

    /// Inserts `node` into the slot `relationship` names, without
    /// re-deriving the relationship from position math. Used wherever the
    /// relationship already travelled on the wire explicitly (`UpdateNeighbors`,
    /// `RemoveAndUpdateNeighbor`) — position alone cannot tell an adjacent
    /// from a parent when the two coincide, e.g. a node's first child is
    /// simultaneously its new `adjacentRight`.
    pub fn set_neighbor(&mut self, relationship: NeighborRelationship, node: NodeInfo) {
        match relationship {
            NeighborRelationship::Parent => self.parent = Some(node),
            NeighborRelationship::Child => {
                if let Some(index) = node.position().and_then(|p| p.child_index()) {
                    self.children.insert(index, node);
                }
            }
            NeighborRelationship::AdjacentLeft => self.adjacent_left = Some(node),
            NeighborRelationship::AdjacentRight => self.adjacent_right = Some(node),
            NeighborRelationship::RoutingTableNeighbor => {
                if let Some(position) = node.position() {
                    self.routing_table_neighbors.insert(position, node);
                }
            }
            NeighborRelationship::RoutingTableNeighborChild => {
                if let Some(position) = node.position() {
                    self.routing_table_neighbor_children.insert(position, node);
                }
            }
            NeighborRelationship::Unknown => {}
        }
    }

    pub fn routing_table_neighbors(&self) -> impl Iterator<Item = &NodeInfo> {
        self.routing_table_neighbors.values()
    }

    pub fn routing_table_neighbor_children(&self) -> impl Iterator<Item = &NodeInfo> {
        self.routing_table_neighbor_children.values()
    }

    /// Every neighbor this node currently tracks, deduplicated.
    pub fn all_neighbors(&self) -> Vec<&NodeInfo> {
        self.parent
            .iter()
            .chain(self.children.values())
            .chain(self.adjacent_left.iter())
            .chain(self.adjacent_right.iter())
            .chain(self.routing_table_neighbors.values())
            .chain(self.routing_table_neighbor_children.values())
            .unique_by(|n| n.id())
            .collect()
    }

    /// Classifies `position` (relative to `self`) into the relationship it
    /// would have if it were a neighbor — used both to decide where an
    /// incoming `NodeInfo` belongs and to validate an update against the
    /// node's own position math.
    ///
    /// Parent/child/routing-table-neighbor are pure position arithmetic —
    /// always derivable from `(level, number, fanout)` alone. Adjacency is
    /// not: a node's in-order predecessor/successor can be an ancestor or
    /// descendant depending on the tree's fill history, so it is tracked as
    /// state (`self.adjacent_left`/`self.adjacent_right`, maintained
    /// incrementally by the join/leave algorithms) rather than recomputed
    /// from position alone. A position that currently occupies one of those
    /// two slots classifies as adjacent even when it would otherwise also
    /// match parent/child (a new first child is simultaneously its parent's
    /// new `adjacentRight`).
    pub fn classify(&self, position: &LogicalPosition) -> Result<NeighborRelationship> {
        let self_position = self
            .self_position()
            .ok_or_else(|| Error::InvalidPosition("self position not yet set".into()))?;

        if self.adjacent_left.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return Ok(NeighborRelationship::AdjacentLeft);
        }
        if self.adjacent_right.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return Ok(NeighborRelationship::AdjacentRight);
        }
        if let Some(parent) = self_position.parent() {
            if parent == *position {
                return Ok(NeighborRelationship::Parent);
            }
        }
        if self_position.children()?.contains(position) {
            return Ok(NeighborRelationship::Child);
        }
        if self_position.routing_table_neighbors().contains(position) {
            return Ok(NeighborRelationship::RoutingTableNeighbor);
        }
        for neighbor_pos in self_position.routing_table_neighbors() {
            if neighbor_pos.children()?.contains(position) {
                return Ok(NeighborRelationship::RoutingTableNeighborChild);
            }
        }
        Ok(NeighborRelationship::Unknown)
    }

    /// Inserts or replaces a neighbor in the slot matching its position.
    pub fn update_neighbor(&mut self, node: NodeInfo) -> Result<NeighborRelationship> {
        let position = node
            .position()
            .ok_or_else(|| Error::InvalidPosition("neighbor has no position".into()))?;
        let relationship = self.classify(&position)?;
        match relationship {
            NeighborRelationship::Parent => self.parent = Some(node),
            NeighborRelationship::Child => {
                let index = position.child_index().expect("child always has an index");
                self.children.insert(index, node);
            }
            NeighborRelationship::AdjacentLeft => self.adjacent_left = Some(node),
            NeighborRelationship::AdjacentRight => self.adjacent_right = Some(node),
            NeighborRelationship::RoutingTableNeighbor => {
                self.routing_table_neighbors.insert(position, node);
            }
            NeighborRelationship::RoutingTableNeighborChild => {
                self.routing_table_neighbor_children.insert(position, node);
            }
            NeighborRelationship::Unknown => {
                return Err(Error::InvalidPosition(format!(
                    "position {position:?} is not a neighbor of {:?}",
                    self.self_position()
                )))
            }
        }
        Ok(relationship)
    }

    /// Removes whatever neighbor currently sits at `position`, if any.
    pub fn remove_neighbor(&mut self, position: &LogicalPosition) -> Option<NodeInfo> {
        if self.parent.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return self.parent.take();
        }
        if let Some(index) = position.child_index() {
            if self.children.get(&index).and_then(|n| n.position()).as_ref() == Some(position) {
                return self.children.remove(&index);
            }
        }
        if self.adjacent_left.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return self.adjacent_left.take();
        }
        if self.adjacent_right.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return self.adjacent_right.take();
        }
        if let Some(node) = self.routing_table_neighbors.remove(position) {
            return Some(node);
        }
        self.routing_table_neighbor_children.remove(position)
    }

    /// Every currently-tracked neighbor occupying `relationship`, used by
    /// the lock-handoff algorithm to turn a `lock_order()` entry into actual
    /// send targets.
    pub fn neighbors_for(&self, relationship: NeighborRelationship) -> Vec<&NodeInfo> {
        match relationship {
            NeighborRelationship::Parent => self.parent.iter().collect(),
            NeighborRelationship::Child => self.children.values().collect(),
            NeighborRelationship::AdjacentLeft => self.adjacent_left.iter().collect(),
            NeighborRelationship::AdjacentRight => self.adjacent_right.iter().collect(),
            NeighborRelationship::RoutingTableNeighbor => self.routing_table_neighbors.values().collect(),
            NeighborRelationship::RoutingTableNeighborChild => {
                self.routing_table_neighbor_children.values().collect()
            }
            NeighborRelationship::Unknown => Vec::new(),
        }
    }

    /// Forgets every neighbor tracked under `relationship`. Used by
    /// `RemoveNeighbor` handling: unlike `remove_neighbor`, which targets one
    /// position, a `RemoveNeighbor` request names only a relationship, so for
    /// the multi-valued categories (children, routing-table neighbors and
    /// their children) every slot in that category is cleared.
    pub fn clear(&mut self, relationship: NeighborRelationship) {
        match relationship {
            NeighborRelationship::Parent => self.parent = None,
            NeighborRelationship::Child => self.children.clear(),
            NeighborRelationship::AdjacentLeft => self.adjacent_left = None,
            NeighborRelationship::AdjacentRight => self.adjacent_right = None,
            NeighborRelationship::RoutingTableNeighbor => self.routing_table_neighbors.clear(),
            NeighborRelationship::RoutingTableNeighborChild => {
                self.routing_table_neighbor_children.clear()
            }
            NeighborRelationship::Unknown => {}
        }
    }

    pub fn neighbor_at(&self, position: &LogicalPosition) -> Option<&NodeInfo> {
        if self.parent.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return self.parent.as_ref();
        }
        if let Some(index) = position.child_index() {
            if let Some(node) = self.children.get(&index) {
                if node.position().as_ref() == Some(position) {
                    return Some(node);
                }
            }
        }
        if self.adjacent_left.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return self.adjacent_left.as_ref();
        }
        if self.adjacent_right.as_ref().and_then(|n| n.position()).as_ref() == Some(position) {
            return self.adjacent_right.as_ref();
        }
        self.routing_table_neighbors
            .get(position)
            .or_else(|| self.routing_table_neighbor_children.get(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_info::NetworkInfo;
    use crate::uuid_gen::Uuid;
    use std::net::Ipv4Addr;

    fn node_at(pos: LogicalPosition, tag: u8) -> NodeInfo {
        NodeInfo::new(Uuid::from_bytes([tag; 16]), NetworkInfo::new(Ipv4Addr::LOCALHOST, 2000 + tag as u16))
            .with_position(pos)
    }

    #[test]
    fn classifies_parent_and_child_correctly() {
        let root = LogicalPosition::root(2).unwrap();
        let child_pos = root.child(0).unwrap();
        let mut routing = RoutingInformation::new(node_at(child_pos, 1));

        let classified = routing.classify(&root).unwrap();
        assert_eq!(classified, NeighborRelationship::Parent);

        routing.update_neighbor(node_at(root, 0)).unwrap();
        assert!(routing.parent().is_some());
    }

    #[test]
    fn rejects_non_neighbor_position() {
        let root = LogicalPosition::root(2).unwrap();
        let routing = RoutingInformation::new(node_at(root, 0));
        let far = LogicalPosition::new(5, 17, 2).unwrap();
        assert_eq!(routing.classify(&far).unwrap(), NeighborRelationship::Unknown);
    }

    #[test]
    fn remove_then_lookup_returns_none() {
        let root = LogicalPosition::root(2).unwrap();
        let child_pos = root.child(1).unwrap();
        let mut routing = RoutingInformation::new(node_at(root, 0));
        routing.update_neighbor(node_at(child_pos, 2)).unwrap();
        assert!(routing.neighbor_at(&child_pos).is_some());
        routing.remove_neighbor(&child_pos);
        assert!(routing.neighbor_at(&child_pos).is_none());
    }

    #[test]
    fn neighbors_for_returns_the_tracked_parent() {
        let root = LogicalPosition::root(2).unwrap();
        let child_pos = root.child(0).unwrap();
        let mut routing = RoutingInformation::new(node_at(child_pos, 1));
        routing.update_neighbor(node_at(root, 0)).unwrap();
        let parents = routing.neighbors_for(NeighborRelationship::Parent);
        assert_eq!(parents.len(), 1);
    }
}
