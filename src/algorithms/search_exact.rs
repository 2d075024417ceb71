use crate::id::NodeInfo;
use crate::position::LogicalPosition;
use crate::routing_information::RoutingInformation;

/// Where a `SearchExact` should go next: this node already owns
/// `destination`, a tracked neighbor is strictly closer and the search
/// keeps going, or no tracked neighbor is any closer than this node itself
/// — the destination position is unreachable from here and the search
/// fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    AtDestination,
    Forward(NodeInfo),
    NoCloserNeighbor,
}

/// Greedy next-hop selection for `SearchExact`.
///
/// Ranks every tracked neighbor against `destination` with
/// [`LogicalPosition::distance_rank`] — primary key is level distance,
/// secondary is the directional number gap — and forwards to whichever
/// neighbor ranks strictly closer than this node's own position. Ties
/// within a rank are broken by the lower uuid so forwarding is
/// deterministic rather than dependent on neighbor iteration order.
///
/// Grounded on spec.md §4.5's three-key metric and its "no neighbor is
/// closer" failure case.
pub fn next_hop(routing: &RoutingInformation, destination: LogicalPosition) -> SearchOutcome {
    let Some(self_position) = routing.self_position() else {
        return SearchOutcome::NoCloserNeighbor;
    };
    if self_position == destination {
        return SearchOutcome::AtDestination;
    }
    let self_rank = self_position.distance_rank(&destination);

    let mut best: Option<((u32, u128), NodeInfo)> = None;
    for neighbor in routing.all_neighbors() {
        let Some(position) = neighbor.position() else {
            continue;
        };
        let rank = position.distance_rank(&destination);
        if rank >= self_rank {
            continue;
        }
        let better = match &best {
            None => true,
            Some((best_rank, best_node)) => {
                rank < *best_rank || (rank == *best_rank && neighbor.id().as_bytes() < best_node.id().as_bytes())
            }
        };
        if better {
            best = Some((rank, *neighbor));
        }
    }
    match best {
        Some((_, node)) => SearchOutcome::Forward(node),
        None => SearchOutcome::NoCloserNeighbor,
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
    fn self_owning_destination_is_at_destination() {
        let root = LogicalPosition::root(2).unwrap();
        let routing = RoutingInformation::new(node_at(root, 0));
        assert_eq!(next_hop(&routing, root), SearchOutcome::AtDestination);
    }

    #[test]
    fn forwards_to_the_closest_known_neighbor() {
        let root = LogicalPosition::root(2).unwrap();
        let child0 = root.child(0).unwrap();
        let mut routing = RoutingInformation::new(node_at(child0, 0));
        routing.update_neighbor(node_at(root, 1)).unwrap();
        let destination = root.child(1).unwrap();
        match next_hop(&routing, destination) {
            SearchOutcome::Forward(hop) => assert_eq!(hop.position(), Some(root)),
            other => panic!("expected a forward, got {other:?}"),
        }
    }

    #[test]
    fn no_neighbor_closer_than_self_fails_the_search() {
        let root = LogicalPosition::root(2).unwrap();
        let child0 = root.child(0).unwrap();
        // A leaf tracking only its parent, asked for a destination that is
        // not itself and for which the parent is no closer (same level
        // distance, no smaller number gap): no progress is possible.
        let routing = RoutingInformation::new(node_at(child0, 0));
        let unreachable_destination = root.child(1).unwrap().child(0).unwrap();
        assert_eq!(next_hop(&routing, unreachable_destination), SearchOutcome::NoCloserNeighbor);
    }

    #[test]
    fn ties_break_towards_the_lower_uuid() {
        use crate::neighbor::NeighborRelationship;

        let self_pos = LogicalPosition::new(1, 0, 10).unwrap();
        let destination = LogicalPosition::new(1, 4, 10).unwrap();
        let mut routing = RoutingInformation::new(node_at(self_pos, 0));
        // Symmetric around `destination`, both two slots away from it —
        // equal rank, and both strictly closer than `self` (gap 4). The
        // lower uuid (tag 1) must win regardless of which relationship
        // slot it was stored under.
        let left = LogicalPosition::new(1, 2, 10).unwrap();
        let right = LogicalPosition::new(1, 6, 10).unwrap();
        routing.set_neighbor(NeighborRelationship::AdjacentLeft, node_at(left, 9));
        routing.set_neighbor(NeighborRelationship::AdjacentRight, node_at(right, 1));
        match next_hop(&routing, destination) {
            SearchOutcome::Forward(hop) => assert_eq!(hop.id().as_bytes()[0], 1),
            other => panic!("expected a forward, got {other:?}"),
        }
    }
}
