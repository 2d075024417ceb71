use crate::id::NodeInfo;
use crate::neighbor::NeighborRelationship;
use crate::routing_information::RoutingInformation;

/// Where a `FindReplacement` search should go next: this node is the
/// replacement (it is a leaf), or the search must continue into the
/// highest-indexed present child (deepest, highest-numbered position in
/// the subtree first).
#[derive(Debug, Clone)]
pub enum ReplacementSearch {
    FoundHere,
    Forward(NodeInfo),
}

pub fn find_replacement(routing: &RoutingInformation) -> ReplacementSearch {
    match routing.children().last() {
        Some(last_child) => ReplacementSearch::Forward(*last_child),
        None => ReplacementSearch::FoundHere,
    }
}

/// Neighbor relationships that must be locked, in order, before a
/// replacement handoff can be applied; released in reverse order on abort.
///
/// Grounded on spec.md §4.4's distributed lock handoff: the lock set is
/// `S = {adjacent-left, adjacent-right, parent (if any), children}` —
/// routing-table neighbors are not repointed by a replacement handoff and so
/// are not locked.
pub fn lock_order(routing: &RoutingInformation) -> Vec<NeighborRelationship> {
    let mut order = Vec::new();
    if routing.adjacent_left().is_some() {
        order.push(NeighborRelationship::AdjacentLeft);
    }
    if routing.adjacent_right().is_some() {
        order.push(NeighborRelationship::AdjacentRight);
    }
    if routing.parent().is_some() {
        order.push(NeighborRelationship::Parent);
    }
    if routing.children().next().is_some() {
        order.push(NeighborRelationship::Child);
    }
    order
}

pub fn release_order(locked: &[NeighborRelationship]) -> Vec<NeighborRelationship> {
    locked.iter().rev().copied().collect()
}

/// True when direct-leave-without-replacement is a legal fallback for this
/// node — only once replacement search has exhausted every path and the
/// node is itself a leaf.
///
/// See DESIGN.md, "leave-protocol fallback scope" for why this does not
/// extend to internal nodes.
pub fn may_direct_leave_without_replacement(routing: &RoutingInformation) -> bool {
    routing.is_leaf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_info::NetworkInfo;
    use crate::position::LogicalPosition;
    use crate::uuid_gen::Uuid;
    use std::net::Ipv4Addr;

    fn node(tag: u8) -> NodeInfo {
        NodeInfo::new(Uuid::from_bytes([tag; 16]), NetworkInfo::new(Ipv4Addr::LOCALHOST, 2000 + tag as u16))
    }

    #[test]
    fn leaf_is_found_here() {
        let mut leaf = node(0);
        leaf.set_position(LogicalPosition::root(2).unwrap());
        let routing = RoutingInformation::new(leaf);
        assert!(matches!(find_replacement(&routing), ReplacementSearch::FoundHere));
    }

    #[test]
    fn internal_node_forwards_into_a_child() {
        let pos = LogicalPosition::root(2).unwrap();
        let mut root = node(0);
        root.set_position(pos);
        let mut routing = RoutingInformation::new(root);
        let mut child = node(1);
        child.set_position(pos.child(0).unwrap());
        routing.update_neighbor(child).unwrap();
        assert!(matches!(find_replacement(&routing), ReplacementSearch::Forward(_)));
    }

    #[test]
    fn release_order_is_reversed() {
        let order = vec![NeighborRelationship::Parent, NeighborRelationship::AdjacentLeft];
        let released = release_order(&order);
        assert_eq!(released, vec![NeighborRelationship::AdjacentLeft, NeighborRelationship::Parent]);
    }
}
