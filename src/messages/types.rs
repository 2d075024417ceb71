use serde::{Deserialize, Serialize};

/// Wire-stable message kind tag.
///
/// Grounded on `original_source/minhton/include/minhton/message/types.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Join,
    JoinAccept,
    JoinAcceptAck,
    JoinRejectDueToMismatch,

    FindReplacement,
    ReplacementOffer,
    ReplacementAck,
    ReplacementNack,
    ReplacementUpdate,
    SignOffParentRequest,
    SignOffParentAnswer,
    RemoveAndUpdateNeighbor,

    UpdateNeighbors,
    GetNeighbors,
    RemoveNeighbor,
    RemoveNeighborAck,
    InformAboutNeighbors,

    LockNeighborRequest,
    LockNeighborResponse,
    UnlockNeighbor,

    SearchExact,
    SearchExactFailure,

    FindQueryRequest,
    FindQueryAnswer,
    AttributeInquiryRequest,
    AttributeInquiryAnswer,
    SubscriptionOrder,
    SubscriptionUpdate,

    BootstrapDiscover,
    BootstrapResponse,
}
