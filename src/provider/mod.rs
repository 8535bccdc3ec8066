//! Provider API boundary
//!
//! Everything that talks to the cloud provider lives here: credential
//! resolution, the HTTP plumbing, and the per-service fetchers that list
//! native records. The inventory core on the other side of this boundary
//! only ever sees normalized [`Resource`](crate::inventory::resource::Resource)s.
//!
//! # Module Structure
//!
//! - [`auth`] - Credential provider seam and token caching
//! - [`client`] - Provider client combining credentials and HTTP
//! - [`http`] - HTTP utilities for REST API calls
//! - [`registry`] - Embedded service definitions (endpoint paths, field mappings)
//! - [`fetcher`] - Per-service fetchers with pagination

pub mod auth;
pub mod client;
pub mod fetcher;
pub mod http;
pub mod registry;
