//! The uniform resource record every provider shape normalizes into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Resource categories covered by the inventory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceType {
    Compute,
    Database,
    ObjectStore,
    ContainerService,
    ContainerCluster,
    Network,
}

impl ResourceType {
    /// Every type the collector fans out to.
    pub fn all() -> [ResourceType; 6] {
        [
            ResourceType::Compute,
            ResourceType::Database,
            ResourceType::ObjectStore,
            ResourceType::ContainerService,
            ResourceType::ContainerCluster,
            ResourceType::Network,
        ]
    }
}

/// One normalized inventory record representing a single cloud entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Globally unique identifier. Either the provider's own canonical
    /// cross-account identifier, or the composite built by [`Resource::global_id`].
    pub id: String,
    pub account_id: String,
    pub region: String,
    pub resource_type: ResourceType,
    /// Display name; falls back to the native identifier when untagged.
    pub name: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Provider-defined status vocabulary, untranslated.
    pub status: String,
    /// Type-specific fields (instance class, CIDR block, node count, ...).
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub created_at: Option<DateTime<Utc>>,
    /// Stamped on every merge.
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Deterministic global identifier for records whose provider exposes no
    /// natively-unique cross-account id. Embeds everything needed to keep
    /// identifiers collision-free across accounts and regions.
    pub fn global_id(
        resource_type: ResourceType,
        region: &str,
        account_id: &str,
        native_id: &str,
    ) -> String {
        format!("{resource_type}:{region}:{account_id}:{native_id}")
    }
}
