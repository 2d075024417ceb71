use thiserror::Error;

use crate::fsm::{EventKind, FsmState};
use crate::neighbor::NeighborRelationship;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while running a participant.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid logical position: {0}")]
    InvalidPosition(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("no transition defined for {event:?} in state {state:?}")]
    FsmViolation { state: FsmState, event: EventKind },

    #[error("lock contention on {relationship:?} neighbor: {reason}")]
    LockContention {
        relationship: NeighborRelationship,
        reason: String,
    },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("transport failure: {0}")]
    TransportFatal(String),

    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] bincode::Error),
}
