//! Service Registry - Load service definitions from JSON
//!
//! One definition per resource type, loaded from JSON files compiled into
//! the binary: where the service is listed (endpoint path per region) and
//! where the interesting fields live inside its native records. Adding a
//! provider service means adding a JSON entry, not code.

use crate::inventory::resource::ResourceType;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded service JSON files (compiled into the binary)
const SERVICE_FILES: &[&str] = &[
    include_str!("services/compute.json"),
    include_str!("services/storage.json"),
    include_str!("services/containers.json"),
];

/// How one provider service is listed and how its native records map onto
/// the uniform resource shape. Field paths use dot notation.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    pub display_name: String,
    /// List endpoint path with a `{region}` placeholder
    pub path_template: String,
    /// Where the item array lives in the list response
    pub response_path: String,
    /// Required native identifier; records missing it are dropped
    pub id_field: String,
    /// Canonical cross-account identifier, used verbatim when present
    #[serde(default)]
    pub global_id_field: Option<String>,
    #[serde(default)]
    pub name_field: Option<String>,
    pub status_field: String,
    #[serde(default)]
    pub tags_field: Option<String>,
    #[serde(default)]
    pub created_field: Option<String>,
    /// Native fields retained in the type-specific attribute bag
    #[serde(default)]
    pub attribute_fields: Vec<String>,
}

/// Root structure of services/*.json
#[derive(Debug, Clone, Deserialize)]
struct ServiceConfig {
    #[serde(default)]
    services: HashMap<ResourceType, ServiceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<HashMap<ResourceType, ServiceDef>> = OnceLock::new();

fn registry() -> &'static HashMap<ResourceType, ServiceDef> {
    REGISTRY.get_or_init(|| {
        let mut services = HashMap::new();

        for content in SERVICE_FILES {
            let partial: ServiceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded service JSON: {}", e));
            services.extend(partial.services);
        }

        services
    })
}

/// Get the service definition for a resource type
pub fn get_service(resource_type: ResourceType) -> Option<&'static ServiceDef> {
    registry().get(&resource_type)
}

/// All registered services
pub fn all_services() -> impl Iterator<Item = (ResourceType, &'static ServiceDef)> {
    registry().iter().map(|(rt, def)| (*rt, def))
}
