use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::timeout::TimeoutType;

pub const FANOUT_MINIMUM: u8 = 2;
pub const FANOUT_MAXIMUM: u8 = 255;
pub const FANOUT_DEFAULT: u8 = 2;

pub const BOOTSTRAP_REPEATS_DEFAULT: u32 = 1;
pub const MULTICAST_PORT: u16 = 11999;
pub const MULTICAST_ADDRESS: &str = "224.1.1.1";
pub const DEFAULT_IP_PORT: u16 = 2000;
pub const DEFAULT_TIMEOUT_LENGTH: Duration = Duration::from_millis(2500);

/// Fixed count of matching entities a `Some`-scoped query truncates to —
/// spec.md §4.7's `kFindQuerySomeScopeThreshold`. Not a fraction of the DSN's
/// total: once this many matches are in hand, the query is satisfied
/// regardless of how many more the DSN could still report.
pub const FIND_QUERY_SOME_SCOPE_THRESHOLD: usize = 5;

/// How long a DSN's cached view of a subtree node's attributes is trusted
/// before a fresh `AttributeInquiryRequest` is sent instead of answering from
/// cache.
pub const DSN_STALENESS_WINDOW: Duration = Duration::from_secs(30);

/// How old a `FindQueryAnswer` entry may be before the query initiator
/// issues a direct `AttributeInquiryRequest` rather than trusting it.
pub const FRESHNESS_THRESHOLD: Duration = Duration::from_secs(10);

/// Network-wide parameters a participant is constructed with.
///
/// Grounded on the teacher's `NetworkParams`/`TransportConfig` pairing: one
/// struct holding the knobs that must agree across the whole overlay
/// (fanout, timeouts) next to the knobs that are purely local (DSN level).
#[derive(Debug, Clone)]
pub struct NetworkParams {
    fanout: u8,
    timeouts: HashMap<TimeoutType, Duration>,
    bootstrap_repeats: u32,
    dsn_level: u32,
    find_query_some_scope_threshold: usize,
    dsn_staleness_window: Duration,
    freshness_threshold: Duration,
}

impl NetworkParams {
    pub fn new(fanout: u8) -> Result<Self> {
        if !(FANOUT_MINIMUM..=FANOUT_MAXIMUM).contains(&fanout) {
            return Err(Error::ConfigError(format!(
                "fanout {fanout} out of range [{FANOUT_MINIMUM},{FANOUT_MAXIMUM}]"
            )));
        }
        let mut timeouts = HashMap::new();
        for kind in TimeoutType::ALL {
            timeouts.insert(*kind, DEFAULT_TIMEOUT_LENGTH);
        }
        Ok(Self {
            fanout,
            timeouts,
            bootstrap_repeats: BOOTSTRAP_REPEATS_DEFAULT,
            dsn_level: 0,
            find_query_some_scope_threshold: FIND_QUERY_SOME_SCOPE_THRESHOLD,
            dsn_staleness_window: DSN_STALENESS_WINDOW,
            freshness_threshold: FRESHNESS_THRESHOLD,
        })
    }

    pub fn fanout(&self) -> u8 {
        self.fanout
    }

    pub fn bootstrap_repeats(&self) -> u32 {
        self.bootstrap_repeats
    }

    pub fn dsn_level(&self) -> u32 {
        self.dsn_level
    }

    pub fn find_query_some_scope_threshold(&self) -> usize {
        self.find_query_some_scope_threshold
    }

    pub fn dsn_staleness_window(&self) -> Duration {
        self.dsn_staleness_window
    }

    pub fn freshness_threshold(&self) -> Duration {
        self.freshness_threshold
    }

    pub fn with_dsn_level(mut self, level: u32) -> Self {
        self.dsn_level = level;
        self
    }

    pub fn with_bootstrap_repeats(mut self, repeats: u32) -> Self {
        self.bootstrap_repeats = repeats;
        self
    }

    pub fn timeout_for(&self, kind: TimeoutType) -> Duration {
        self.timeouts.get(&kind).copied().unwrap_or(DEFAULT_TIMEOUT_LENGTH)
    }

    pub fn set_timeout(&mut self, kind: TimeoutType, duration: Duration) {
        self.timeouts.insert(kind, duration);
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::new(FANOUT_DEFAULT).expect("default fanout is always valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_fanout() {
        assert!(NetworkParams::new(1).is_err());
        assert!(NetworkParams::new(0).is_err());
    }

    #[test]
    fn accepts_boundary_fanout() {
        assert!(NetworkParams::new(FANOUT_MINIMUM).is_ok());
        assert!(NetworkParams::new(FANOUT_MAXIMUM).is_ok());
    }

    #[test]
    fn default_timeout_is_populated_for_every_kind() {
        let params = NetworkParams::default();
        for kind in TimeoutType::ALL {
            assert_eq!(params.timeout_for(*kind), DEFAULT_TIMEOUT_LENGTH);
        }
    }
}
