//! Service Fetchers
//!
//! One fetcher per resource type. Each lists a service's native records for
//! a region; a failure stays inside the returned error so the collector can
//! record it without aborting the rest of the cycle.

use super::client::ProviderClient;
use super::http::format_provider_error;
use super::registry::{self, ServiceDef};
use crate::error::InventoryError;
use crate::inventory::resource::ResourceType;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// The provider fetch seam: list native records of one type for a region.
#[async_trait]
pub trait ServiceFetcher: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    async fn fetch(
        &self,
        client: &ProviderClient,
        region: &str,
    ) -> Result<Vec<Value>, InventoryError>;
}

/// Registry-driven REST fetcher (auto-paginates via `nextPageToken`).
pub struct RestServiceFetcher {
    resource_type: ResourceType,
    def: &'static ServiceDef,
}

impl RestServiceFetcher {
    pub fn new(resource_type: ResourceType, def: &'static ServiceDef) -> Self {
        Self { resource_type, def }
    }

    async fn fetch_page(
        &self,
        client: &ProviderClient,
        region: &str,
        page_token: Option<&str>,
    ) -> anyhow::Result<(Vec<Value>, Option<String>)> {
        let url = client.service_url(self.def, region, page_token);
        let response = client.get(&url).await?;

        let items = extract_items(&response, &self.def.response_path);
        let next_token = response
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok((items, next_token))
    }
}

#[async_trait]
impl ServiceFetcher for RestServiceFetcher {
    fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    async fn fetch(
        &self,
        client: &ProviderClient,
        region: &str,
    ) -> Result<Vec<Value>, InventoryError> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let (items, next_token) = self
                .fetch_page(client, region, page_token.as_deref())
                .await
                .map_err(|e| InventoryError::Fetch {
                    service: self.resource_type,
                    region: region.to_string(),
                    message: format_provider_error(&e),
                })?;
            all_items.extend(items);

            match next_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_items)
    }
}

/// One REST fetcher per registered service.
pub fn default_fetchers() -> Vec<Arc<dyn ServiceFetcher>> {
    registry::all_services()
        .map(|(resource_type, def)| {
            Arc::new(RestServiceFetcher::new(resource_type, def)) as Arc<dyn ServiceFetcher>
        })
        .collect()
}

/// Extract list items from a response using a dot-notation path
fn extract_items(response: &Value, path: &str) -> Vec<Value> {
    if path.is_empty() {
        return response.as_array().cloned().unwrap_or_default();
    }

    let mut current = response;
    for part in path.split('.') {
        current = match current.get(part) {
            Some(v) => v,
            None => return vec![],
        };
    }

    current.as_array().cloned().unwrap_or_default()
}

/// Look up a value in a native record using a dot-notation path
pub fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
