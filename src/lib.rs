//! stratus - multi-account cloud resource inventory
//!
//! Fans out to per-service provider APIs for every active account,
//! normalizes the divergent shapes into one resource schema, merges the
//! results into a persisted set that tolerates partial failure without
//! losing previously known data, and serves filter, search, and summary
//! queries over the merged view.

pub mod account;
pub mod config;
pub mod error;
pub mod inventory;
pub mod provider;

pub use error::{InventoryError, InventoryResult};
pub use inventory::engine::InventoryEngine;
