use serde::{Deserialize, Serialize};

/// Which deadline is being armed. Each variant maps to one of the FSM's
/// "wait for X" states.
///
/// Grounded verbatim on `original_source/minhton/include/minhton/core/constants.h`'s
/// `TimeoutType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeoutType {
    BootstrapResponseTimeout,
    JoinAcceptResponseTimeout,
    JoinAcceptAckResponseTimeout,
    ReplacementAckResponseTimeout,
    ReplacementOfferResponseTimeout,
    DsnAggregationTimeout,
    InquiryAggregationTimeout,
    SelfDepartureRetry,
    JoinRetry,
}

impl TimeoutType {
    pub const ALL: &'static [TimeoutType] = &[
        TimeoutType::BootstrapResponseTimeout,
        TimeoutType::JoinAcceptResponseTimeout,
        TimeoutType::JoinAcceptAckResponseTimeout,
        TimeoutType::ReplacementAckResponseTimeout,
        TimeoutType::ReplacementOfferResponseTimeout,
        TimeoutType::DsnAggregationTimeout,
        TimeoutType::InquiryAggregationTimeout,
        TimeoutType::SelfDepartureRetry,
        TimeoutType::JoinRetry,
    ];
}
