//! Collection snapshots
//!
//! A snapshot is everything one refresh attempt learned about a single
//! account. It is built once by the collector and never mutated afterwards;
//! the store only reads it.

use crate::inventory::resource::{Resource, ResourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One failed service fetch within a collection cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionError {
    pub service: ResourceType,
    pub region: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// The complete result of collecting one account.
///
/// Only successfully fetched types appear as keys in `resources`. Failed
/// fetches are recorded in `errors`, which is what keeps the store from
/// touching their previously persisted data at merge time.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot {
    pub account_id: String,
    pub taken_at: DateTime<Utc>,
    pub resources: HashMap<ResourceType, Vec<Resource>>,
    pub errors: Vec<CollectionError>,
    /// Set when credential retrieval failed before any fetcher ran.
    pub auth_failed: bool,
}

impl CollectionSnapshot {
    /// Total resources across all successfully fetched types.
    pub fn resource_count(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }
}
