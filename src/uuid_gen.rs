use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 128-bit participant identifier, stable for the node's lifetime.
///
/// Grounded on `original_source/minhton/include/minhton/utils/uuid.h`'s
/// `std::array<uint8_t, 16>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uuid(uuid::Uuid);

impl Uuid {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    fn ascending(counter: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[8..16].copy_from_slice(&counter.to_be_bytes());
        Self::from_bytes(bytes)
    }
}

impl std::fmt::Display for Uuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Selects one of the two generation strategies the original implementation
/// supports. Fixed per participant at construction time (see DESIGN.md,
/// "UUID generator selection").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidGenerator {
    /// Cryptographically random, matching `libuuid`'s `generateUUID()`.
    Real,
    /// Deterministic, monotonically increasing — useful for reproducible
    /// tests and logs, matching the original's "Ascending" mode.
    Ascending,
}

impl UuidGenerator {
    pub fn generate(&self, counter: &AtomicU64) -> Uuid {
        match self {
            UuidGenerator::Real => Uuid(uuid::Uuid::new_v4()),
            UuidGenerator::Ascending => {
                let next = counter.fetch_add(1, Ordering::Relaxed);
                Uuid::ascending(next)
            }
        }
    }
}

/// Monotonic-ish counter backing `UuidGenerator::Ascending`. Owned by
/// whichever scope wants deterministic ids (typically one per participant).
#[derive(Debug, Default)]
pub struct AscendingCounter(AtomicU64);

impl AscendingCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inner(&self) -> &AtomicU64 {
        &self.0
    }
}

/// A `u64` event id, used to correlate a request with its response via
/// `ref_event_id`. Generated per
/// `original_source/minhton/src/utils/uuid_generator.cpp`'s
/// `generateEventId()`: uniformly distributed below `i64::MAX`, so the value
/// always fits in a signed 64-bit field on the wire if ever required.
pub fn generate_event_id() -> u64 {
    rand::thread_rng().gen_range(0..i64::MAX as u64)
}
