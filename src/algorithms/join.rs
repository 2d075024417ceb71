use crate::id::NodeInfo;
use crate::messages::join::JoinAccept;
use crate::routing_information::RoutingInformation;

/// Where a `Join` request should go next: accepted right here, or forwarded
/// one hop down towards a free slot.
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Accept(JoinAccept),
    Forward(NodeInfo),
}

/// Finds where `joiner` should attach: the first node (depth-first,
/// lowest-index-first) with a free child slot.
///
/// Grounded on teacher's `node/stage/bootstrapping.rs` dispatch shape
/// (match incoming message, decide next stage) generalized to MINHTON's
/// tree-build rule from spec.md §4.3.
pub fn handle_join(routing: &RoutingInformation, fanout: u8) -> JoinOutcome {
    for index in 0..fanout {
        if routing.child_at(index).is_none() {
            let self_position = routing
                .self_position()
                .expect("only connected nodes process Join");
            let assigned_position = self_position
                .child(index)
                .expect("index is within fanout range");
            return JoinOutcome::Accept(JoinAccept {
                assigned_position,
                parent: *routing.self_node(),
                adjacent_left: adjacent_left_for_new_child(routing, index),
                adjacent_right: adjacent_right_for_new_child(routing, index, fanout),
            });
        }
    }
    // Every slot the node has directly is full: descend into the fullest
    // existing child so the subtree fills breadth-first-ish without needing
    // global state.
    let forward_to = routing
        .children()
        .next()
        .expect("fanout >= 2 guarantees at least one child once all slots are full")
        .clone();
    JoinOutcome::Forward(forward_to)
}

/// The new child's adjacent-left: the parent's own adjacent-left if this is
/// its first child (the child slots right in ahead of the parent, taking
/// over the parent's old left neighbor), or the previous sibling otherwise.
///
/// Grounded on spec.md §8/S2 and §4.1's in-order linearisation: a node's
/// children come before it in-order, so the first child inherits whatever
/// used to sit to the parent's left — which may be an ancestor several
/// levels up, not a same-level sibling.
fn adjacent_left_for_new_child(routing: &RoutingInformation, index: u8) -> Option<NodeInfo> {
    if index == 0 {
        routing.adjacent_left().copied()
    } else {
        routing.child_at(index - 1).copied()
    }
}

/// The new child's adjacent-right: the parent itself, unless this child
/// fills the parent's last slot — in which case the parent leaves the
/// in-order chain entirely (it is now full, its children fully represent
/// it) and the new child inherits the parent's own old adjacent-right.
fn adjacent_right_for_new_child(routing: &RoutingInformation, index: u8, fanout: u8) -> Option<NodeInfo> {
    if index == fanout - 1 {
        routing.adjacent_right().copied()
    } else {
        Some(*routing.self_node())
    }
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
    fn root_with_free_slot_accepts_directly() {
        let mut root = node(0);
        root.set_position(LogicalPosition::root(2).unwrap());
        let routing = RoutingInformation::new(root);
        match handle_join(&routing, 2) {
            JoinOutcome::Accept(accept) => assert_eq!(accept.assigned_position.number(), 0),
            JoinOutcome::Forward(_) => panic!("expected direct accept"),
        }
    }

    /// S2: a root's first child gets the root as its `adjacentRight` and no
    /// `adjacentLeft` — a cross-level adjacency, not a same-level sibling.
    #[test]
    fn first_child_inherits_root_as_adjacent_right() {
        let mut root = node(0);
        root.set_position(LogicalPosition::root(2).unwrap());
        let routing = RoutingInformation::new(root);
        match handle_join(&routing, 2) {
            JoinOutcome::Accept(accept) => {
                assert_eq!(accept.adjacent_right, Some(root));
                assert_eq!(accept.adjacent_left, None);
            }
            JoinOutcome::Forward(_) => panic!("expected direct accept"),
        }
    }

    #[test]
    fn full_node_forwards_to_a_child() {
        let mut root = node(0);
        root.set_position(LogicalPosition::root(2).unwrap());
        let mut routing = RoutingInformation::new(root);
        let pos = LogicalPosition::root(2).unwrap();
        for i in 0..2u8 {
            let mut child = node(i + 1);
            child.set_position(pos.child(i).unwrap());
            routing.update_neighbor(child).unwrap();
        }
        match handle_join(&routing, 2) {
            JoinOutcome::Forward(_) => {}
            JoinOutcome::Accept(_) => panic!("expected forward once full"),
        }
    }
}
