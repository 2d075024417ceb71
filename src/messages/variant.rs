use serde::{Deserialize, Serialize};

use crate::messages::bootstrap::{BootstrapDiscover, BootstrapResponse};
use crate::messages::entity_search::{
    AttributeInquiryAnswer, AttributeInquiryRequest, FindQueryAnswer, FindQueryRequest,
    SubscriptionOrder, SubscriptionUpdate,
};
use crate::messages::join::{Join, JoinAccept, JoinAcceptAck, JoinRejectDueToMismatch};
use crate::messages::leave::{
    FindReplacement, LockNeighborRequest, LockNeighborResponse, ReplacementAck, ReplacementNack,
    ReplacementOffer, ReplacementUpdate, SignOffParentAnswer, SignOffParentRequest,
    UnlockNeighbor,
};
use crate::messages::response::{
    GetNeighbors, InformAboutNeighbors, RemoveAndUpdateNeighbor, RemoveNeighbor,
    RemoveNeighborAck, UpdateNeighbors,
};
use crate::messages::search_exact::{SearchExact, SearchExactFailure};

/// The payload carried by a `MessageHeader`.
///
/// Grounded on the teacher's `messages::variant::Variant` (one tagged enum
/// over every message payload the overlay exchanges), re-purposed from
/// `sn_routing`'s section-management vocabulary to MINHTON's
/// join/leave/search-exact/response/entity-search vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageVariant {
    Join(Join),
    JoinAccept(JoinAccept),
    JoinAcceptAck(JoinAcceptAck),
    JoinRejectDueToMismatch(JoinRejectDueToMismatch),

    FindReplacement(FindReplacement),
    ReplacementOffer(ReplacementOffer),
    ReplacementAck(ReplacementAck),
    ReplacementNack(ReplacementNack),
    ReplacementUpdate(ReplacementUpdate),
    SignOffParentRequest(SignOffParentRequest),
    SignOffParentAnswer(SignOffParentAnswer),
    RemoveAndUpdateNeighbor(RemoveAndUpdateNeighbor),

    UpdateNeighbors(UpdateNeighbors),
    GetNeighbors(GetNeighbors),
    RemoveNeighbor(RemoveNeighbor),
    RemoveNeighborAck(RemoveNeighborAck),
    InformAboutNeighbors(InformAboutNeighbors),

    LockNeighborRequest(LockNeighborRequest),
    LockNeighborResponse(LockNeighborResponse),
    UnlockNeighbor(UnlockNeighbor),

    SearchExact(SearchExact),
    SearchExactFailure(SearchExactFailure),

    FindQueryRequest(FindQueryRequest),
    FindQueryAnswer(FindQueryAnswer),
    AttributeInquiryRequest(AttributeInquiryRequest),
    AttributeInquiryAnswer(AttributeInquiryAnswer),
    SubscriptionOrder(SubscriptionOrder),
    SubscriptionUpdate(SubscriptionUpdate),

    BootstrapDiscover(BootstrapDiscover),
    BootstrapResponse(BootstrapResponse),
}

impl MessageVariant {
    pub fn message_type(&self) -> crate::messages::types::MessageType {
        use crate::messages::types::MessageType as T;
        match self {
            MessageVariant::Join(_) => T::Join,
            MessageVariant::JoinAccept(_) => T::JoinAccept,
            MessageVariant::JoinAcceptAck(_) => T::JoinAcceptAck,
            MessageVariant::JoinRejectDueToMismatch(_) => T::JoinRejectDueToMismatch,
            MessageVariant::FindReplacement(_) => T::FindReplacement,
            MessageVariant::ReplacementOffer(_) => T::ReplacementOffer,
            MessageVariant::ReplacementAck(_) => T::ReplacementAck,
            MessageVariant::ReplacementNack(_) => T::ReplacementNack,
            MessageVariant::ReplacementUpdate(_) => T::ReplacementUpdate,
            MessageVariant::SignOffParentRequest(_) => T::SignOffParentRequest,
            MessageVariant::SignOffParentAnswer(_) => T::SignOffParentAnswer,
            MessageVariant::RemoveAndUpdateNeighbor(_) => T::RemoveAndUpdateNeighbor,
            MessageVariant::UpdateNeighbors(_) => T::UpdateNeighbors,
            MessageVariant::GetNeighbors(_) => T::GetNeighbors,
            MessageVariant::RemoveNeighbor(_) => T::RemoveNeighbor,
            MessageVariant::RemoveNeighborAck(_) => T::RemoveNeighborAck,
            MessageVariant::InformAboutNeighbors(_) => T::InformAboutNeighbors,
            MessageVariant::LockNeighborRequest(_) => T::LockNeighborRequest,
            MessageVariant::LockNeighborResponse(_) => T::LockNeighborResponse,
            MessageVariant::UnlockNeighbor(_) => T::UnlockNeighbor,
            MessageVariant::SearchExact(_) => T::SearchExact,
            MessageVariant::SearchExactFailure(_) => T::SearchExactFailure,
            MessageVariant::FindQueryRequest(_) => T::FindQueryRequest,
            MessageVariant::FindQueryAnswer(_) => T::FindQueryAnswer,
            MessageVariant::AttributeInquiryRequest(_) => T::AttributeInquiryRequest,
            MessageVariant::AttributeInquiryAnswer(_) => T::AttributeInquiryAnswer,
            MessageVariant::SubscriptionOrder(_) => T::SubscriptionOrder,
            MessageVariant::SubscriptionUpdate(_) => T::SubscriptionUpdate,
            MessageVariant::BootstrapDiscover(_) => T::BootstrapDiscover,
            MessageVariant::BootstrapResponse(_) => T::BootstrapResponse,
        }
    }
}
