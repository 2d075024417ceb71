use serde::{Deserialize, Serialize};

use crate::network_info::NetworkInfo;
use crate::position::LogicalPosition;
use crate::uuid_gen::Uuid;

/// Everything needed to address and identify a peer: its place in the tree
/// (once it has one), where to reach it, and its stable id.
///
/// "Initialised" iff both `position` is set and `network` is valid — see
/// spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeInfo {
    id: Uuid,
    position: Option<LogicalPosition>,
    network: NetworkInfo,
}

impl NodeInfo {
    pub fn new(id: Uuid, network: NetworkInfo) -> Self {
        Self {
            id,
            position: None,
            network,
        }
    }

    pub fn with_position(mut self, position: LogicalPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn position(&self) -> Option<LogicalPosition> {
        self.position
    }

    pub fn network(&self) -> NetworkInfo {
        self.network
    }

    pub fn is_initialized(&self) -> bool {
        self.position.is_some() && self.network.is_valid()
    }

    pub fn set_position(&mut self, position: LogicalPosition) {
        self.position = Some(position);
    }
}
