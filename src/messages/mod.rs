pub mod bootstrap;
pub mod entity_search;
pub mod header;
pub mod join;
pub mod leave;
pub mod response;
pub mod search_exact;
pub mod types;
pub mod variant;

use serde::{Deserialize, Serialize};

pub use header::MessageHeader;
pub use types::MessageType;
pub use variant::MessageVariant;

/// A complete on-the-wire message: header plus payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub header: MessageHeader,
    pub variant: MessageVariant,
}

impl Message {
    pub fn new(header: MessageHeader, variant: MessageVariant) -> Self {
        Self { header, variant }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeInfo;
    use crate::messages::join::Join;
    use crate::network_info::NetworkInfo;
    use crate::position::LogicalPosition;
    use crate::uuid_gen::Uuid;
    use std::net::Ipv4Addr;

    fn node(tag: u8) -> NodeInfo {
        NodeInfo::new(Uuid::from_bytes([tag; 16]), NetworkInfo::new(Ipv4Addr::LOCALHOST, 2000 + tag as u16))
            .with_position(LogicalPosition::root(2).unwrap())
    }

    #[test]
    fn envelope_round_trips_through_bincode() {
        let header = MessageHeader::new(node(1), node(2), MessageType::Join, 42);
        let message = Message::new(
            header,
            MessageVariant::Join(Join { joiner: node(1) }),
        );
        let bytes = bincode::serialize(&message).unwrap();
        let decoded: Message = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.header.event_id(), 42);
        assert_eq!(decoded.variant.message_type(), MessageType::Join);
    }

    #[test]
    fn header_rejects_uninitialised_sender() {
        let uninitialised = NodeInfo::new(Uuid::from_bytes([9; 16]), NetworkInfo::unset());
        let header = MessageHeader::new(uninitialised, node(2), MessageType::Join, 1);
        assert!(header.validate().is_err());
    }
}
