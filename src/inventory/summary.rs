//! Summary Aggregator
//!
//! Grouped counts over a filtered subset of the resource set. Shares the
//! query engine's filter semantics, minus pagination.

use crate::error::InventoryError;
use crate::inventory::query::ResourceFilter;
use crate::inventory::resource::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of resources sharing one grouping value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBucket {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub total: usize,
    pub by_type: Vec<SummaryBucket>,
    pub by_status: Vec<SummaryBucket>,
    pub by_region: Vec<SummaryBucket>,
}

/// Grouped counts by type, status, and region over the filtered subset.
///
/// Grouping keys are the literal string values in the data - no taxonomy
/// normalization, so differently-cased statuses are distinct buckets.
pub fn summarize(
    resources: &[Resource],
    filter: &ResourceFilter,
) -> Result<ResourceSummary, InventoryError> {
    filter.validate()?;

    let matched: Vec<&Resource> = resources.iter().filter(|r| filter.matches(r)).collect();

    Ok(ResourceSummary {
        total: matched.len(),
        by_type: bucket(matched.iter().map(|r| r.resource_type.to_string())),
        by_status: bucket(matched.iter().map(|r| r.status.clone())),
        by_region: bucket(matched.iter().map(|r| r.region.clone())),
    })
}

fn bucket(values: impl Iterator<Item = String>) -> Vec<SummaryBucket> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(value, count)| SummaryBucket { value, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::resource::ResourceType;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn resource(
        account: &str,
        region: &str,
        resource_type: ResourceType,
        native_id: &str,
        status: &str,
    ) -> Resource {
        Resource {
            id: Resource::global_id(resource_type, region, account, native_id),
            account_id: account.to_string(),
            region: region.to_string(),
            resource_type,
            name: native_id.to_string(),
            tags: HashMap::new(),
            status: status.to_string(),
            attributes: serde_json::Map::new(),
            created_at: None,
            updated_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn counts_group_by_type_status_and_region() {
        let resources = vec![
            resource("111111111111", "us-east-1", ResourceType::Compute, "i-a", "running"),
            resource("111111111111", "us-east-1", ResourceType::Compute, "i-b", "stopped"),
            resource("111111111111", "eu-west-1", ResourceType::Database, "db-1", "available"),
        ];

        let summary = summarize(&resources, &ResourceFilter::default()).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.by_type,
            vec![
                SummaryBucket {
                    value: "compute".to_string(),
                    count: 2
                },
                SummaryBucket {
                    value: "database".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(summary.by_region.len(), 2);
        assert_eq!(summary.by_status.len(), 3);
    }

    #[test]
    fn differently_cased_statuses_stay_distinct() {
        let resources = vec![
            resource("111111111111", "us-east-1", ResourceType::Compute, "i-a", "running"),
            resource("111111111111", "us-east-1", ResourceType::Compute, "i-b", "RUNNING"),
        ];

        let summary = summarize(&resources, &ResourceFilter::default()).unwrap();
        assert_eq!(
            summary.by_status,
            vec![
                SummaryBucket {
                    value: "RUNNING".to_string(),
                    count: 1
                },
                SummaryBucket {
                    value: "running".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn summary_respects_the_filter() {
        let resources = vec![
            resource("111111111111", "us-east-1", ResourceType::Compute, "i-a", "running"),
            resource("222222222222", "us-east-1", ResourceType::Compute, "i-z", "running"),
        ];

        let filter = ResourceFilter {
            account_ids: vec!["111111111111".to_string()],
            ..Default::default()
        };
        let summary = summarize(&resources, &filter).unwrap();
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn invalid_filters_are_rejected_here_too() {
        let filter = ResourceFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert!(summarize(&[], &filter).is_err());
    }

    #[test]
    fn empty_subset_yields_empty_buckets() {
        let summary = summarize(&[], &ResourceFilter::default()).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.by_type.is_empty());
        assert!(summary.by_status.is_empty());
        assert!(summary.by_region.is_empty());
    }
}
