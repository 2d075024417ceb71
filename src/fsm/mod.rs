use serde::{Deserialize, Serialize};

use crate::messages::types::MessageType;
use crate::timeout::TimeoutType;

/// Participant lifecycle state.
///
/// Grounded verbatim on `original_source/minhton/include/minhton/core/constants.h`'s
/// `FSMState` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsmState {
    Idle,
    WaitForBootstrapResponse,
    WaitForJoinAccept,
    Connected,
    ConnectedAcceptingChild,
    ConnectedReplacing,
    WaitForReplacementOffer,
    ConnectedWaitingParentResponse,
    SignOffFromInlevelNeighbors,
    ConnectedWaitingParentResponseDirectLeaveWoReplacement,
    SignOffFromInlevelNeighborsDirectLeaveWoReplacement,
    JoinFailed,
    ErrorState,
}

/// Locally-raised signals that kick off a protocol, as opposed to messages
/// arriving over the network.
///
/// Grounded on `original_source/minhton/include/minhton/core/constants.h`'s
/// `SignalType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    JoinNetwork,
    LeaveNetwork,
    Cleanup,
}

/// What the event loop is reacting to this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message(MessageType),
    Timeout(TimeoutType),
    Signal(SignalType),
}

/// What a transition tells the event loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next_state: FsmState,
}

impl Transition {
    pub fn to(next_state: FsmState) -> Self {
        Self { next_state }
    }
}

/// Declarative `(state, event) -> next_state` table.
///
/// Per DESIGN NOTES §9 this is a flat `match`, not a dispatch trait per
/// state — unlisted pairs are the FSM's own violation signal and are turned
/// into `Error::FsmViolation` by the caller, which is expected to move the
/// participant to `FsmState::ErrorState` (the exception being late
/// duplicate responses, filtered out upstream via the continuation table
/// before they ever reach this function).
pub fn transition(state: FsmState, event: EventKind) -> Option<Transition> {
    use EventKind::*;
    use FsmState::*;
    use MessageType as M;
    use SignalType as S;
    use TimeoutType as T;

    let next = match (state, event) {
        (Idle, Signal(S::JoinNetwork)) => WaitForBootstrapResponse,
        (Idle, Message(M::BootstrapDiscover)) => Idle,

        (WaitForBootstrapResponse, Message(M::BootstrapResponse)) => WaitForJoinAccept,
        (WaitForBootstrapResponse, Timeout(T::BootstrapResponseTimeout)) => JoinFailed,

        (WaitForJoinAccept, Message(M::JoinAccept)) => Connected,
        (WaitForJoinAccept, Message(M::JoinRejectDueToMismatch)) => WaitForBootstrapResponse,
        (WaitForJoinAccept, Timeout(T::JoinAcceptResponseTimeout)) => JoinFailed,
        (WaitForJoinAccept, Timeout(T::JoinRetry)) => WaitForBootstrapResponse,

        (Connected, Message(M::Join)) => ConnectedAcceptingChild,
        (Connected, Signal(S::LeaveNetwork)) => ConnectedWaitingParentResponse,
        (Connected, Message(M::BootstrapDiscover)) => Connected,
        (Connected, Message(M::UpdateNeighbors)) => Connected,
        (Connected, Message(M::GetNeighbors)) => Connected,
        (Connected, Message(M::RemoveNeighbor)) => Connected,
        (Connected, Message(M::RemoveAndUpdateNeighbor)) => Connected,
        (Connected, Message(M::InformAboutNeighbors)) => Connected,
        (Connected, Message(M::SearchExact)) => Connected,
        (Connected, Message(M::FindQueryRequest)) => Connected,
        (Connected, Message(M::FindQueryAnswer)) => Connected,
        (Connected, Message(M::AttributeInquiryRequest)) => Connected,
        (Connected, Message(M::AttributeInquiryAnswer)) => Connected,
        (Connected, Message(M::SubscriptionOrder)) => Connected,
        (Connected, Message(M::SubscriptionUpdate)) => Connected,
        (Connected, Message(M::FindReplacement)) => Connected,
        (Connected, Message(M::ReplacementAck)) => Connected,
        (Connected, Message(M::ReplacementNack)) => Connected,
        (Connected, Message(M::ReplacementUpdate)) => Connected,
        (Connected, Message(M::RemoveNeighborAck)) => Connected,
        (Connected, Message(M::LockNeighborRequest)) => Connected,
        (Connected, Message(M::LockNeighborResponse)) => Connected,
        (Connected, Message(M::UnlockNeighbor)) => Connected,
        (Connected, Message(M::SignOffParentRequest)) => Connected,
        (Connected, Message(M::SearchExactFailure)) => Connected,

        (ConnectedAcceptingChild, Message(M::JoinAcceptAck)) => Connected,
        (ConnectedAcceptingChild, Timeout(T::JoinAcceptAckResponseTimeout)) => Connected,

        (ConnectedWaitingParentResponse, Message(M::FindReplacement)) => WaitForReplacementOffer,
        (ConnectedWaitingParentResponse, Timeout(T::SelfDepartureRetry)) => {
            ConnectedWaitingParentResponseDirectLeaveWoReplacement
        }

        (WaitForReplacementOffer, Message(M::ReplacementOffer)) => ConnectedReplacing,
        (WaitForReplacementOffer, Timeout(T::ReplacementOfferResponseTimeout)) => {
            ConnectedWaitingParentResponseDirectLeaveWoReplacement
        }

        (ConnectedReplacing, Message(M::ReplacementAck)) => SignOffFromInlevelNeighbors,
        (ConnectedReplacing, Message(M::ReplacementNack)) => WaitForReplacementOffer,
        (ConnectedReplacing, Timeout(T::ReplacementAckResponseTimeout)) => WaitForReplacementOffer,

        (SignOffFromInlevelNeighbors, Message(M::RemoveNeighborAck)) => Idle,

        (
            ConnectedWaitingParentResponseDirectLeaveWoReplacement,
            Message(M::SignOffParentAnswer),
        ) => SignOffFromInlevelNeighborsDirectLeaveWoReplacement,

        (
            SignOffFromInlevelNeighborsDirectLeaveWoReplacement,
            Message(M::RemoveNeighborAck),
        ) => Idle,

        (JoinFailed, Signal(S::JoinNetwork)) => WaitForBootstrapResponse,
        (ErrorState, Signal(S::Cleanup)) => Idle,

        _ => return None,
    };
    Some(Transition::to(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_happy_path_reaches_connected() {
        let mut state = FsmState::Idle;
        let events = [
            EventKind::Signal(SignalType::JoinNetwork),
            EventKind::Message(MessageType::BootstrapResponse),
            EventKind::Message(MessageType::JoinAccept),
        ];
        for event in events {
            state = transition(state, event).expect("transition should be defined").next_state;
        }
        assert_eq!(state, FsmState::Connected);
    }

    #[test]
    fn unlisted_pair_yields_none() {
        assert!(transition(FsmState::Idle, EventKind::Message(MessageType::JoinAccept)).is_none());
    }

    #[test]
    fn bootstrap_timeout_fails_the_join() {
        let next = transition(
            FsmState::WaitForBootstrapResponse,
            EventKind::Timeout(TimeoutType::BootstrapResponseTimeout),
        )
        .unwrap();
        assert_eq!(next.next_state, FsmState::JoinFailed);
    }
}
