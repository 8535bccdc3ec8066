//! Query Engine
//!
//! Filter, search, sort, and paginate the persisted resource set. Every
//! filter field is optional and defaults to "no constraint": values within
//! a field are OR-ed, populated fields are AND-ed together.

use crate::error::InventoryError;
use crate::inventory::resource::{Resource, ResourceType};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

/// Combinable predicates over the resource set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFilter {
    #[serde(default)]
    pub account_ids: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub resource_types: Vec<ResourceType>,
    #[serde(default)]
    pub statuses: Vec<String>,
    /// Case-insensitive substring match against name or identifier
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl ResourceFilter {
    /// Reject structurally invalid filters before any execution
    pub fn validate(&self) -> Result<(), InventoryError> {
        match self.limit {
            Some(0) => Err(InventoryError::Validation {
                reason: "limit must be at least 1".to_string(),
            }),
            Some(limit) if limit > MAX_LIMIT => Err(InventoryError::Validation {
                reason: format!("limit {limit} exceeds the maximum of {MAX_LIMIT}"),
            }),
            _ => Ok(()),
        }
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// AND across populated fields, OR within each field
    pub fn matches(&self, resource: &Resource) -> bool {
        if !self.account_ids.is_empty() && !self.account_ids.contains(&resource.account_id) {
            return false;
        }
        if !self.regions.is_empty() && !self.regions.contains(&resource.region) {
            return false;
        }
        if !self.resource_types.is_empty()
            && !self.resource_types.contains(&resource.resource_type)
        {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&resource.status) {
            return false;
        }
        if let Some(search) = &self.search {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let hit = resource.name.to_lowercase().contains(&needle)
                    || resource.id.to_lowercase().contains(&needle);
                if !hit {
                    return false;
                }
            }
        }
        true
    }
}

/// One page of query results plus pagination bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage {
    pub resources: Vec<Resource>,
    /// Matching count before pagination
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Run a filter over the resource set
pub fn execute(resources: &[Resource], filter: &ResourceFilter) -> Result<QueryPage, InventoryError> {
    filter.validate()?;

    let mut matched: Vec<Resource> = resources
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    sort_resources(&mut matched);

    let total = matched.len();
    let limit = filter.effective_limit();
    let offset = filter.effective_offset();
    let page: Vec<Resource> = matched.into_iter().skip(offset).take(limit).collect();
    let has_more = offset + page.len() < total;

    Ok(QueryPage {
        resources: page,
        total,
        limit,
        offset,
        has_more,
    })
}

/// Most recently updated first; ties break on identifier so pagination is
/// stable across equal timestamps
pub fn sort_resources(resources: &mut [Resource]) {
    resources.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
