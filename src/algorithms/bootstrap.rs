use crate::id::NodeInfo;
use crate::messages::bootstrap::{BootstrapDiscover, BootstrapResponse};
use crate::routing_information::RoutingInformation;

/// Builds the UDP multicast discovery packet a joining node broadcasts.
///
/// Grounded on teacher's `node/stage/bootstrapping.rs::send_bootstrap_request`,
/// generalized from a direct unicast retry to a multicast fan-out (spec.md
/// §6.2).
pub fn build_discover(joiner: NodeInfo) -> BootstrapDiscover {
    BootstrapDiscover { discoverer: joiner }
}

/// Any already-connected node that overhears a `BootstrapDiscover` answers
/// with itself as the entry point for the subsequent `Join`.
pub fn handle_discover(routing: &RoutingInformation) -> Option<BootstrapResponse> {
    if routing.self_position().is_some() {
        Some(BootstrapResponse {
            entry_point: *routing.self_node(),
        })
    } else {
        None
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
    fn unpositioned_node_does_not_answer_discover() {
        let routing = RoutingInformation::new(node(1));
        assert!(handle_discover(&routing).is_none());
    }

    #[test]
    fn connected_node_answers_with_itself() {
        let mut routing = RoutingInformation::new(node(1));
        routing.set_self_position(LogicalPosition::root(2).unwrap());
        assert!(handle_discover(&routing).is_some());
    }
}
