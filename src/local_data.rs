use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::id::NodeInfo;

/// Whether an attribute is expected to keep changing (battery level,
/// queue depth) or to hold steady once set (hardware model, role).
///
/// Grounded on spec.md §3's `LocalData` data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Static,
    Dynamic,
}

#[derive(Debug, Clone)]
pub struct AttributeEntry {
    pub value: String,
    pub timestamp: Instant,
    pub value_type: ValueType,
}

/// Everything a local mutation (`localInsert`/`localUpdate`/`localRemove`)
/// hands back to the caller to act on: who to push a `SubscriptionUpdate`
/// to, and the fresh snapshot to forward to the covering DSN (unless this
/// node is itself a DSN, in which case there is nothing to forward).
///
/// Grounded on spec.md §4.7: "the owner (a) updates all subscribers of that
/// key via SubscriptionUpdate, (b) if not itself a DSN, pushes its new
/// attribute set to its covering DSN".
#[derive(Debug, Clone)]
pub struct MutationEffect {
    pub key: String,
    pub subscribers: Vec<NodeInfo>,
    pub holders: Vec<NodeInfo>,
}

/// The key-value attribute store each participant maintains about itself,
/// plus who is subscribed to each key's changes.
///
/// Grounded on spec.md §3's `LocalData` and §4.7's entity search.
#[derive(Debug, Default, Clone)]
pub struct LocalData {
    entries: HashMap<String, AttributeEntry>,
    subscribers: HashMap<String, Vec<NodeInfo>>,
}

impl LocalData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` for the first time or overwrites it, keeping only the
    /// latest value by timestamp — a local clock can't go backwards, so this
    /// always wins, but a value pulled in from a remote snapshot with an
    /// older timestamp than what's already stored is rejected by
    /// `insert_if_newer`.
    pub fn local_insert(&mut self, key: &str, value: String, value_type: ValueType, holder: NodeInfo) -> MutationEffect {
        self.entries.insert(
            key.to_string(),
            AttributeEntry {
                value,
                timestamp: Instant::now(),
                value_type,
            },
        );
        self.effect_for(key, holder)
    }

    pub fn local_update(&mut self, key: &str, value: String, holder: NodeInfo) -> Option<MutationEffect> {
        let value_type = self.entries.get(key)?.value_type;
        self.entries.insert(
            key.to_string(),
            AttributeEntry {
                value,
                timestamp: Instant::now(),
                value_type,
            },
        );
        Some(self.effect_for(key, holder))
    }

    pub fn local_remove(&mut self, key: &str, holder: NodeInfo) -> Option<MutationEffect> {
        self.entries.remove(key)?;
        Some(self.effect_for(key, holder))
    }

    pub fn get(&self, key: &str) -> Option<&AttributeEntry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn effect_for(&self, key: &str, holder: NodeInfo) -> MutationEffect {
        MutationEffect {
            key: key.to_string(),
            subscribers: self.subscribers_of(key).to_vec(),
            holders: if self.entries.contains_key(key) { vec![holder] } else { Vec::new() },
        }
    }

    pub fn subscribe(&mut self, attribute: &str, subscriber: NodeInfo) {
        let subs = self.subscribers.entry(attribute.to_string()).or_default();
        if !subs.iter().any(|n| n.id() == subscriber.id()) {
            subs.push(subscriber);
        }
    }

    pub fn unsubscribe(&mut self, attribute: &str, subscriber: &NodeInfo) {
        if let Some(subs) = self.subscribers.get_mut(attribute) {
            subs.retain(|n| n.id() != subscriber.id());
        }
    }

    pub fn subscribers_of(&self, attribute: &str) -> &[NodeInfo] {
        self.subscribers
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// `NodeInfo` keyed by its stable id for set membership — positions can
/// move but identity doesn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeInfoKey(NodeInfo);

impl std::borrow::Borrow<NodeInfo> for NodeInfoKey {
    fn borrow(&self) -> &NodeInfo {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct SubtreeSnapshot {
    attributes: HashSet<String>,
    last_seen: Instant,
}

/// A DSN's aggregated view of the attribute sets held by nodes in its
/// subtree, with a staleness window governing when cached answers are
/// trusted versus when a fresh `AttributeInquiryRequest` is needed.
///
/// Grounded on spec.md §4.7's `DSNHandler`.
#[derive(Debug, Clone, Default)]
pub struct DsnHandler {
    snapshots: HashMap<NodeInfoKey, SubtreeSnapshot>,
    subscribed: HashSet<NodeInfoKey>,
}

impl DsnHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or refreshes) `node`'s attribute set, as pushed via
    /// `AttributeInquiryAnswer`. Returns `true` the first time `node` is
    /// seen, signaling the caller should issue a `SubscriptionOrder` to keep
    /// the cache warm as that node's attributes change.
    pub fn record(&mut self, node: NodeInfo, attributes: Vec<String>) -> bool {
        let first_time = !self.subscribed.contains(&NodeInfoKey(node));
        self.snapshots.insert(
            NodeInfoKey(node),
            SubtreeSnapshot {
                attributes: attributes.into_iter().collect(),
                last_seen: Instant::now(),
            },
        );
        if first_time {
            self.subscribed.insert(NodeInfoKey(node));
        }
        first_time
    }

    pub fn forget(&mut self, node: &NodeInfo) {
        self.snapshots.remove(node);
        self.subscribed.remove(node);
    }

    /// Every tracked node whose last-seen snapshot names `attribute` and is
    /// still within `staleness_window`.
    pub fn holders_of(&self, attribute: &str, staleness_window: std::time::Duration) -> Vec<NodeInfo> {
        let now = Instant::now();
        self.snapshots
            .iter()
            .filter(|(_, snapshot)| {
                now.duration_since(snapshot.last_seen) <= staleness_window && snapshot.attributes.contains(attribute)
            })
            .map(|(node, _)| node.0)
            .collect()
    }

    pub fn is_stale(&self, node: &NodeInfo, staleness_window: std::time::Duration) -> bool {
        match self.snapshots.get(node) {
            Some(snapshot) => Instant::now().duration_since(snapshot.last_seen) > staleness_window,
            None => true,
        }
    }
}
