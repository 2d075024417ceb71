use crate::error::{Error, Result};
use crate::id::NodeInfo;
use crate::messages::{Message, MessageHeader, MessageVariant, MessageType};
use crate::transport::tcp;

/// Sends serialized messages to peers over TCP, resolving a `NodeInfo`'s
/// `NetworkInfo` to a socket address first.
///
/// Grounded on `original_source/minhton/src/network/network_facade.cpp`,
/// which sits between the algorithms and the raw socket layer: it knows
/// how to turn a logical target into a transport-level send, nothing more.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkFacade;

impl NetworkFacade {
    pub fn new() -> Self {
        Self
    }

    pub async fn send(&self, target: &NodeInfo, header: MessageHeader, variant: MessageVariant) -> Result<()> {
        let addr = target
            .network()
            .socket_addr()
            .ok_or_else(|| Error::TransportFatal("target has no resolvable address".into()))?;
        let message = Message::new(header, variant);
        tcp::send_message(addr, &message).await
    }

    pub fn build_header(
        &self,
        sender: &NodeInfo,
        target: &NodeInfo,
        message_type: MessageType,
        event_id: u64,
        ref_event_id: Option<u64>,
    ) -> MessageHeader {
        let header = MessageHeader::new(*sender, *target, message_type, event_id);
        match ref_event_id {
            Some(id) => header.in_response_to(id),
            None => header,
        }
    }
}
