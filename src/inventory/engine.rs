//! Engine facade
//!
//! Wires the collector, store, and query paths together behind the surface
//! callers consume: `refresh`, `query`, `summarize`. The bundled CLI and
//! any HTTP layer sit on top of exactly this.

use crate::account::AccountSource;
use crate::error::{InventoryError, InventoryResult};
use crate::inventory::collector::Collector;
use crate::inventory::query::{self, QueryPage, ResourceFilter};
use crate::inventory::snapshot::CollectionError;
use crate::inventory::store::ResourceStore;
use crate::inventory::summary::{self, ResourceSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// What one refresh cycle did for one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRefreshOutcome {
    pub account_id: String,
    /// Resources across the successfully fetched types only
    pub resource_count: usize,
    pub errors: Vec<CollectionError>,
    pub auth_failed: bool,
}

/// Per-account outcomes of one refresh cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub per_account: Vec<AccountRefreshOutcome>,
}

impl RefreshReport {
    pub fn total_resources(&self) -> usize {
        self.per_account.iter().map(|a| a.resource_count).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.per_account.iter().map(|a| a.errors.len()).sum()
    }
}

pub struct InventoryEngine {
    accounts: Arc<dyn AccountSource>,
    collector: Collector,
    store: ResourceStore,
}

impl InventoryEngine {
    pub fn new(accounts: Arc<dyn AccountSource>, collector: Collector, store: ResourceStore) -> Self {
        Self {
            accounts,
            collector,
            store,
        }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Run one refresh cycle for a single account (or all active accounts),
    /// merge every snapshot, and report per-account outcomes.
    ///
    /// Individual account and service failures land in the report; the only
    /// hard errors are an unusable account selector and a merge conflict.
    pub async fn refresh(&self, account_id: Option<&str>) -> InventoryResult<RefreshReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut accounts = self
            .accounts
            .list_active_accounts()
            .await
            .map_err(|e| InventoryError::Internal(format!("account source failed: {e}")))?;

        if let Some(id) = account_id {
            accounts.retain(|a| a.id == id);
            if accounts.is_empty() {
                return Err(InventoryError::Validation {
                    reason: format!("unknown or inactive account '{id}'"),
                });
            }
        }

        info!(%run_id, accounts = accounts.len(), "starting refresh cycle");
        let snapshots = self.collector.collect_all(&accounts).await;

        let mut per_account = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            self.store.merge(snapshot).await?;
            per_account.push(AccountRefreshOutcome {
                account_id: snapshot.account_id.clone(),
                resource_count: snapshot.resource_count(),
                errors: snapshot.errors.clone(),
                auth_failed: snapshot.auth_failed,
            });
        }

        let report = RefreshReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            per_account,
        };
        info!(
            %run_id,
            resources = report.total_resources(),
            errors = report.total_errors(),
            "refresh cycle finished"
        );
        Ok(report)
    }

    pub async fn query(&self, filter: &ResourceFilter) -> InventoryResult<QueryPage> {
        let resources = self.store.all().await;
        query::execute(&resources, filter)
    }

    pub async fn summarize(&self, filter: &ResourceFilter) -> InventoryResult<ResourceSummary> {
        let resources = self.store.all().await;
        summary::summarize(&resources, filter)
    }
}
