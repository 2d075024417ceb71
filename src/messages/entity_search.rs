use serde::{Deserialize, Serialize};

use crate::id::NodeInfo;

/// Attribute query scope: does the caller need every matching entity
/// ("all") or is the first sufficiently-sized batch acceptable ("some",
/// governed by `find_query_some_scope_threshold`)?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryScope {
    All,
    Some,
}

/// Requests entities matching `attribute` from the DSN hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindQueryRequest {
    pub attribute: String,
    pub scope: QueryScope,
    pub requester: NodeInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindQueryAnswer {
    pub matches: Vec<NodeInfo>,
}

/// Asks a node to report its current value for `attribute` — sent either by
/// a DSN pulling a fresh snapshot from a node in its subtree, or directly by
/// a query initiator when a `FindQueryAnswer` entry violated the freshness
/// threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeInquiryRequest {
    pub attribute: String,
    pub requester: NodeInfo,
}

/// `reporter`'s current attribute keys — either the full local set (an
/// unsolicited push to the covering DSN on `localInsert`/`localUpdate`/
/// `localRemove`) or a direct answer to `AttributeInquiryRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeInquiryAnswer {
    pub reporter: NodeInfo,
    pub attributes: Vec<String>,
}

/// Places or withdraws a DSN's standing subscription to `attribute` changes
/// on `subscriber` — issued as nodes join or leave the DSN's subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionOrder {
    pub attribute: String,
    pub subscriber: NodeInfo,
    pub subscribe: bool,
}

/// Pushed to subscribers whenever the attribute's holder set changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub attribute: String,
    pub holders: Vec<NodeInfo>,
}
