//! Normalizer
//!
//! Maps one provider-native record into the uniform [`Resource`] shape.
//! Normalization is total over partial data: every optional field that is
//! missing or malformed gets a neutral default. The only record it rejects
//! is one without its native identifier.

use crate::error::InventoryError;
use crate::inventory::resource::{Resource, ResourceType};
use crate::provider::fetcher::lookup_path;
use crate::provider::registry::ServiceDef;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Conventional tag providers put display names under
const NAME_TAG: &str = "Name";

pub fn normalize(
    record: &Value,
    account_id: &str,
    region: &str,
    resource_type: ResourceType,
    def: &ServiceDef,
) -> Result<Resource, InventoryError> {
    let native_id = lookup_path(record, &def.id_field)
        .and_then(value_as_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| InventoryError::Normalization {
            reason: format!(
                "{resource_type} record in {region} is missing its '{}' field",
                def.id_field
            ),
        })?;

    // Prefer the provider's own canonical identifier; otherwise build one
    // that embeds everything needed for cross-account uniqueness.
    let id = def
        .global_id_field
        .as_deref()
        .and_then(|field| lookup_path(record, field))
        .and_then(value_as_string)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Resource::global_id(resource_type, region, account_id, &native_id));

    let tags = def
        .tags_field
        .as_deref()
        .and_then(|field| lookup_path(record, field))
        .map(extract_tags)
        .unwrap_or_default();

    let name = tags
        .get(NAME_TAG)
        .cloned()
        .or_else(|| {
            def.name_field
                .as_deref()
                .and_then(|field| lookup_path(record, field))
                .and_then(value_as_string)
        })
        .unwrap_or_else(|| native_id.clone());

    let status = lookup_path(record, &def.status_field)
        .and_then(value_as_string)
        .unwrap_or_default();

    let created_at = def
        .created_field
        .as_deref()
        .and_then(|field| lookup_path(record, field))
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    let mut attributes = Map::new();
    for field in &def.attribute_fields {
        if let Some(value) = lookup_path(record, field) {
            if !value.is_null() {
                attributes.insert(field.clone(), value.clone());
            }
        }
    }

    Ok(Resource {
        id,
        account_id: account_id.to_string(),
        region: region.to_string(),
        resource_type,
        name,
        tags,
        status,
        attributes,
        created_at,
        updated_at: Utc::now(),
    })
}

/// Extract tags from either provider representation: a list of key/value
/// objects (`{"key": ..., "value": ...}` or capitalized) or a flat string
/// map. Anything malformed yields an empty map, never a failure.
fn extract_tags(value: &Value) -> HashMap<String, String> {
    match value {
        Value::Array(entries) => entries.iter().filter_map(tag_entry).collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => HashMap::new(),
    }
}

fn tag_entry(entry: &Value) -> Option<(String, String)> {
    let key = entry.get("key").or_else(|| entry.get("Key"))?.as_str()?;
    let value = entry.get("value").or_else(|| entry.get("Value"))?.as_str()?;
    Some((key.to_string(), value.to_string()))
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
