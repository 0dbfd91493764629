//! Persistence layer for the iFence geofence core.
//!
//! This crate contains:
//! - The key-value store contract and its in-memory and file-backed implementations
//! - Entity definitions (the JSON shapes the mobile app stores)
//! - Repository implementations for zones, wristbands, trails and alarm history

pub mod entities;
pub mod keys;
pub mod locks;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
