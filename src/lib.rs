//! MINHTON: a self-organising m-ary tree structured peer-to-peer overlay.
//!
//! A participant joins at a logical position in an m-ary tree, tracks a
//! bounded neighbor set (parent, children, adjacents, routing-table
//! neighbors), and supports exact-position lookup, attribute-based entity
//! search, and graceful departure with replacement.

pub mod algorithms;
pub mod config;
pub mod continuation;
pub mod error;
pub mod fsm;
pub mod id;
pub mod local_data;
pub mod messages;
pub mod network_facade;
pub mod network_info;
pub mod neighbor;
pub mod participant;
pub mod position;
pub mod routing_information;
pub mod timeout;
pub mod transport;
pub mod uuid_gen;

pub use config::NetworkParams;
pub use error::{Error, Result};
pub use id::NodeInfo;
pub use network_info::NetworkInfo;
pub use participant::{Event, Participant};
pub use position::LogicalPosition;
pub use uuid_gen::{Uuid, UuidGenerator};
