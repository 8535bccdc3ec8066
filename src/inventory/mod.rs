//! Resource aggregation and query engine
//!
//! The inventory core: collect native records per account, normalize them
//! into one resource schema, merge snapshots into the persisted set with
//! partial-failure isolation, and answer filter/search/summary queries.
//!
//! # Module Structure
//!
//! - [`resource`] - The uniform resource record and type enum
//! - [`snapshot`] - What one collection cycle produced for one account
//! - [`normalize`] - Provider-native record to resource mapping
//! - [`collector`] - Concurrent fan-out over fetchers and accounts
//! - [`store`] - Merge/upsert with per-(account, type) stale removal
//! - [`query`] - Filter, search, sort, pagination
//! - [`summary`] - Grouped counts over a filtered subset
//! - [`engine`] - The facade callers consume

pub mod collector;
pub mod engine;
pub mod normalize;
pub mod query;
pub mod resource;
pub mod snapshot;
pub mod store;
pub mod summary;
