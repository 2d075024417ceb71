use crate::error::{Error, Result};
use crate::messages::response::{GetNeighbors, InformAboutNeighbors, UpdateNeighbors};
use crate::neighbor::NeighborRelationship;
use crate::routing_information::RoutingInformation;

/// Applies a pushed `UpdateNeighbors` to the local routing view.
///
/// Each update already carries the relationship it belongs to, so it is
/// applied directly rather than re-derived via `classify()` — position
/// alone cannot disambiguate a neighbor that is simultaneously e.g. a
/// parent and an adjacent.
///
/// Grounded on `original_source/minhton/include/minhton/algorithms/misc/response_algorithm_general.h`'s
/// `processUpdateNeighbors`.
pub fn apply_update_neighbors(routing: &mut RoutingInformation, update: &UpdateNeighbors) {
    for (relationship, node) in &update.updates {
        routing.set_neighbor(*relationship, *node);
    }
}

/// `processRemoveNeighbor`: the parent link is load-bearing for every other
/// algorithm in this module, so removing it outright is rejected rather than
/// honored — a leave or lock-handoff bug that tries it should fail loudly
/// instead of silently detaching the node from the tree.
///
/// Grounded on spec.md §4.6.
pub fn apply_remove_neighbor(routing: &mut RoutingInformation, relationship: NeighborRelationship) -> Result<()> {
    if relationship == NeighborRelationship::Parent {
        return Err(Error::InvalidMessage(
            "RemoveNeighbor must not target the parent relationship".into(),
        ));
    }
    routing.clear(relationship);
    Ok(())
}

/// `processGetNeighbors`: builds the answer the requester is waiting for.
///
/// Rejects an empty `relationships` list — spec.md §4.6 treats a
/// `GetNeighbors` naming nothing as invalid rather than an implicit
/// "everything" or "nothing" request.
pub fn build_inform_about_neighbors(
    routing: &RoutingInformation,
    request: &GetNeighbors,
) -> Result<InformAboutNeighbors> {
    if request.relationships.is_empty() {
        return Err(Error::InvalidMessage(
            "GetNeighbors requested an empty relationship set".into(),
        ));
    }
    let mut neighbors = Vec::new();
    for relationship in &request.relationships {
        for node in routing.neighbors_for(*relationship) {
            neighbors.push((*relationship, *node));
        }
    }
    Ok(InformAboutNeighbors { neighbors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeInfo;
    use crate::network_info::NetworkInfo;
    use crate::position::LogicalPosition;
    use crate::uuid_gen::Uuid;
    use std::net::Ipv4Addr;

    fn node_at(pos: LogicalPosition, tag: u8) -> NodeInfo {
        NodeInfo::new(Uuid::from_bytes([tag; 16]), NetworkInfo::new(Ipv4Addr::LOCALHOST, 2000 + tag as u16))
            .with_position(pos)
    }

    #[test]
    fn removing_the_parent_is_rejected() {
        let root = LogicalPosition::root(2).unwrap();
        let child = root.child(0).unwrap();
        let mut routing = RoutingInformation::new(node_at(child, 0));
        routing.update_neighbor(node_at(root, 1)).unwrap();
        assert!(apply_remove_neighbor(&mut routing, NeighborRelationship::Parent).is_err());
        assert!(routing.parent().is_some(), "rejected removal must not mutate state");
    }

    #[test]
    fn removing_a_child_clears_it() {
        let root = LogicalPosition::root(2).unwrap();
        let child_pos = root.child(0).unwrap();
        let mut routing = RoutingInformation::new(node_at(root, 0));
        routing.update_neighbor(node_at(child_pos, 1)).unwrap();
        assert!(routing.child_at(0).is_some());
        apply_remove_neighbor(&mut routing, NeighborRelationship::Child).unwrap();
        assert!(routing.child_at(0).is_none());
    }

    #[test]
    fn get_neighbors_only_returns_requested_relationships() {
        let root = LogicalPosition::root(2).unwrap();
        let child = root.child(0).unwrap();
        let mut routing = RoutingInformation::new(node_at(child, 0));
        routing.update_neighbor(node_at(root, 1)).unwrap();
        let request = GetNeighbors {
            send_back_to: *routing.self_node(),
            relationships: vec![NeighborRelationship::Parent],
        };
        let answer = build_inform_about_neighbors(&routing, &request).unwrap();
        assert_eq!(answer.neighbors.len(), 1);
    }

    #[test]
    fn empty_relationship_request_is_rejected() {
        let root = LogicalPosition::root(2).unwrap();
        let routing = RoutingInformation::new(node_at(root, 0));
        let request = GetNeighbors {
            send_back_to: *routing.self_node(),
            relationships: vec![],
        };
        assert!(build_inform_about_neighbors(&routing, &request).is_err());
    }
}
