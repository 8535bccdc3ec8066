//! Error taxonomy for the inventory engine
//!
//! Fetch and normalization failures are captured next to the data they
//! relate to (inside the collection snapshot) rather than thrown past the
//! collector; only query validation and merge conflicts propagate to
//! callers directly.

use crate::inventory::resource::ResourceType;
use thiserror::Error;

pub type InventoryResult<T> = Result<T, InventoryError>;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// Transient failure of one service fetch (network, timeout,
    /// throttling). Recorded per service and retried next cycle; never
    /// fatal to the snapshot.
    #[error("fetching {service} in {region}: {message}")]
    Fetch {
        service: ResourceType,
        region: String,
        message: String,
    },

    /// Credentials for an account are missing, expired, or rejected. The
    /// whole account's cycle is marked failed and its stored data retained.
    #[error("authentication failed for account {account_id}: {message}")]
    Auth { account_id: String, message: String },

    /// A native record too malformed to normalize. The record is dropped
    /// and the cycle continues.
    #[error("malformed provider record: {reason}")]
    Normalization { reason: String },

    /// A structurally invalid query filter, rejected before execution.
    #[error("invalid filter: {reason}")]
    Validation { reason: String },

    /// An identifier collision across (account, type) owners. Identifiers
    /// are constructed to be globally unique, so this indicates an
    /// id-construction bug and is surfaced instead of swallowed.
    #[error("merge conflict on {id}: stored owner {existing_owner}, incoming {incoming_owner}")]
    MergeConflict {
        id: String,
        existing_owner: String,
        incoming_owner: String,
    },

    #[error("{0}")]
    Internal(String),
}
