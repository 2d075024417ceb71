use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::NodeInfo;
use crate::messages::types::MessageType;

/// Envelope wrapped around every `MessageVariant`.
///
/// Grounded on `original_source/minhton/include/minhton/message/serialize.h`
/// and the header fields implied throughout `original_source/minhton/include/minhton/message/*.h`
/// (`getSender`, `getTarget`, `getType`). `event_id`/`ref_event_id` realize
/// the continuation-passing mechanism from DESIGN NOTES §9.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    sender: NodeInfo,
    target: NodeInfo,
    message_type: MessageType,
    event_id: u64,
    ref_event_id: Option<u64>,
}

impl MessageHeader {
    pub fn new(sender: NodeInfo, target: NodeInfo, message_type: MessageType, event_id: u64) -> Self {
        Self {
            sender,
            target,
            message_type,
            event_id,
            ref_event_id: None,
        }
    }

    pub fn in_response_to(mut self, ref_event_id: u64) -> Self {
        self.ref_event_id = Some(ref_event_id);
        self
    }

    pub fn sender(&self) -> &NodeInfo {
        &self.sender
    }

    pub fn target(&self) -> &NodeInfo {
        &self.target
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub fn ref_event_id(&self) -> Option<u64> {
        self.ref_event_id
    }

    /// Both sender and target must already be initialised (positioned and
    /// reachable) for the message to be routable — except `BootstrapDiscover`
    /// and `Join`, whose whole point is that the sender doesn't have a
    /// position yet.
    pub fn validate(&self) -> Result<()> {
        let sender_may_be_unpositioned = matches!(
            self.message_type,
            MessageType::BootstrapDiscover | MessageType::Join
        );
        if !self.sender.is_initialized() && !sender_may_be_unpositioned {
            return Err(Error::InvalidMessage(
                "sender is not initialised".to_string(),
            ));
        }
        Ok(())
    }
}
