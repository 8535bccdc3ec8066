//! Collector
//!
//! Orchestrates the per-service fetchers for each account. Fetchers within
//! one account run fully in parallel with independent failure domains;
//! accounts run in parallel up to a bounded limit so provider-side
//! throttling isn't tripped. A failed fetch becomes a [`CollectionError`]
//! inside the snapshot - it never aborts the cycle or the other accounts.

use crate::account::AccountDescriptor;
use crate::config::Config;
use crate::error::InventoryError;
use crate::inventory::normalize;
use crate::inventory::resource::{Resource, ResourceType};
use crate::inventory::snapshot::{CollectionError, CollectionSnapshot};
use crate::provider::auth::CredentialProvider;
use crate::provider::client::ProviderClient;
use crate::provider::fetcher::{default_fetchers, ServiceFetcher};
use crate::provider::registry;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Tuning knobs for a collection cycle
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub endpoint: String,
    pub fetch_timeout: Duration,
    pub account_concurrency: usize,
    pub refresh_deadline: Duration,
}

impl CollectorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            account_concurrency: config.account_concurrency.max(1),
            refresh_deadline: Duration::from_secs(config.refresh_deadline_secs),
        }
    }
}

pub struct Collector {
    credentials: Arc<dyn CredentialProvider>,
    fetchers: Vec<Arc<dyn ServiceFetcher>>,
    settings: CollectorSettings,
}

impl Collector {
    /// Collector with the full registry-driven fetcher set
    pub fn new(credentials: Arc<dyn CredentialProvider>, settings: CollectorSettings) -> Self {
        Self {
            credentials,
            fetchers: default_fetchers(),
            settings,
        }
    }

    /// Replace the registered fetchers (tests inject their own here)
    pub fn with_fetchers(mut self, fetchers: Vec<Arc<dyn ServiceFetcher>>) -> Self {
        self.fetchers = fetchers;
        self
    }

    /// Collect a snapshot for one account.
    ///
    /// Never fails: credential and fetch problems are recorded inside the
    /// snapshot so the caller can merge and report what did succeed.
    pub async fn collect(&self, account: &AccountDescriptor) -> CollectionSnapshot {
        let credentials = match self.credentials.get_credentials(account).await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(account = %account.id, error = %e, "credential retrieval failed, marking account failed for this cycle");
                return self.failed_snapshot(account, e.to_string(), true);
            }
        };

        let client = match ProviderClient::new(&self.settings.endpoint, credentials) {
            Ok(client) => client,
            Err(e) => {
                warn!(account = %account.id, error = %e, "provider client setup failed");
                return self.failed_snapshot(account, e.to_string(), false);
            }
        };

        let region = account.region.as_str();
        let fetches = self.fetchers.iter().map(|fetcher| {
            let client = client.clone();
            async move {
                let resource_type = fetcher.resource_type();
                let outcome =
                    match tokio::time::timeout(self.settings.fetch_timeout, fetcher.fetch(&client, region))
                        .await
                    {
                        Ok(Ok(records)) => Ok(records),
                        Ok(Err(e)) => Err(e.to_string()),
                        // A timeout is a failure, not "zero resources" -
                        // otherwise it would masquerade as stale removal.
                        Err(_) => Err(format!("timed out after {:?}", self.settings.fetch_timeout)),
                    };
                (resource_type, outcome)
            }
        });

        let results = futures::future::join_all(fetches).await;

        let taken_at = Utc::now();
        let mut resources = HashMap::new();
        let mut errors = Vec::new();

        for (resource_type, outcome) in results {
            match outcome {
                Ok(records) => {
                    let normalized = self.normalize_records(account, resource_type, &records);
                    debug!(account = %account.id, service = %resource_type, count = normalized.len(), "service fetch succeeded");
                    resources.insert(resource_type, normalized);
                }
                Err(message) => {
                    warn!(account = %account.id, service = %resource_type, error = %message, "service fetch failed");
                    errors.push(CollectionError {
                        service: resource_type,
                        region: account.region.clone(),
                        message,
                        occurred_at: Utc::now(),
                    });
                }
            }
        }

        info!(
            account = %account.id,
            services_ok = resources.len(),
            services_failed = errors.len(),
            "collection cycle finished"
        );

        CollectionSnapshot {
            account_id: account.id.clone(),
            taken_at,
            resources,
            errors,
            auth_failed: false,
        }
    }

    /// Collect snapshots for every account, bounded to the configured
    /// concurrency. Accounts still pending at the refresh deadline are
    /// reported failed for this cycle rather than silently dropped.
    pub async fn collect_all(&self, accounts: &[AccountDescriptor]) -> Vec<CollectionSnapshot> {
        let semaphore = Arc::new(Semaphore::new(self.settings.account_concurrency));
        let deadline = tokio::time::Instant::now() + self.settings.refresh_deadline;

        let cycles = accounts.iter().map(|account| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let cycle = async {
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            warn!(account = %account.id, "concurrency limiter closed, skipping account");
                            return self.failed_snapshot(
                                account,
                                "concurrency limiter closed".to_string(),
                                false,
                            );
                        }
                    };
                    self.collect(account).await
                };

                match tokio::time::timeout_at(deadline, cycle).await {
                    Ok(snapshot) => snapshot,
                    Err(_) => {
                        warn!(account = %account.id, "refresh deadline exceeded");
                        self.failed_snapshot(
                            account,
                            format!(
                                "refresh deadline of {:?} exceeded",
                                self.settings.refresh_deadline
                            ),
                            false,
                        )
                    }
                }
            }
        });

        futures::future::join_all(cycles).await
    }

    fn normalize_records(
        &self,
        account: &AccountDescriptor,
        resource_type: ResourceType,
        records: &[Value],
    ) -> Vec<Resource> {
        let Some(def) = registry::get_service(resource_type) else {
            warn!(service = %resource_type, "no service definition registered, dropping records");
            return Vec::new();
        };

        records
            .iter()
            .filter_map(|record| {
                match normalize::normalize(record, &account.id, &account.region, resource_type, def)
                {
                    Ok(resource) => Some(resource),
                    Err(e) => {
                        warn!(account = %account.id, service = %resource_type, error = %e, "dropping malformed record");
                        None
                    }
                }
            })
            .collect()
    }

    /// Snapshot for an account whose whole cycle failed before (or instead
    /// of) fetching: every registered service gets a collection error, no
    /// type counts as successfully fetched.
    fn failed_snapshot(
        &self,
        account: &AccountDescriptor,
        message: String,
        auth_failed: bool,
    ) -> CollectionSnapshot {
        let occurred_at = Utc::now();
        let errors = self
            .fetchers
            .iter()
            .map(|fetcher| CollectionError {
                service: fetcher.resource_type(),
                region: account.region.clone(),
                message: message.clone(),
                occurred_at,
            })
            .collect();

        CollectionSnapshot {
            account_id: account.id.clone(),
            taken_at: occurred_at,
            resources: HashMap::new(),
            errors,
            auth_failed,
        }
    }
}
