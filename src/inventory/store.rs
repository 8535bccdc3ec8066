//! Resource Store
//!
//! The persisted resource set, keyed by global identifier. Merging a
//! snapshot replaces exactly the (account, type) subsets that were
//! successfully fetched and leaves failed ones untouched - a transient
//! fetch failure never loses previously known data. Merges for the same
//! (account, type) key serialize on a keyed lock; unrelated keys proceed
//! concurrently.

use crate::error::InventoryError;
use crate::inventory::resource::{Resource, ResourceType};
use crate::inventory::snapshot::CollectionSnapshot;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

#[derive(Default)]
pub struct ResourceStore {
    resources: RwLock<HashMap<String, Resource>>,
    merge_locks: Mutex<HashMap<(String, ResourceType), Arc<Mutex<()>>>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn merge_lock(&self, account_id: &str, resource_type: ResourceType) -> Arc<Mutex<()>> {
        let mut locks = self.merge_locks.lock().await;
        locks
            .entry((account_id.to_string(), resource_type))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Merge one snapshot into the persisted set.
    ///
    /// Each successfully fetched (account, type) subset is replaced
    /// wholesale: upsert by identifier, then drop identifiers the snapshot
    /// no longer reports (stale removal). Types listed in the snapshot's
    /// errors never reach this map and stay exactly as they were.
    ///
    /// Returns a [`InventoryError::MergeConflict`] when an incoming
    /// identifier is already owned by a different (account, type) - that
    /// subset is left unchanged.
    pub async fn merge(&self, snapshot: &CollectionSnapshot) -> Result<(), InventoryError> {
        for (&resource_type, incoming) in &snapshot.resources {
            let key_lock = self.merge_lock(&snapshot.account_id, resource_type).await;
            let _guard = key_lock.lock().await;

            let mut map = self.resources.write().await;

            for resource in incoming {
                if let Some(existing) = map.get(&resource.id) {
                    if existing.account_id != snapshot.account_id
                        || existing.resource_type != resource_type
                    {
                        let existing_owner =
                            format!("{}/{}", existing.account_id, existing.resource_type);
                        let incoming_owner =
                            format!("{}/{}", snapshot.account_id, resource_type);
                        error!(
                            id = %resource.id,
                            existing = %existing_owner,
                            incoming = %incoming_owner,
                            "identifier collision across owners, refusing to merge"
                        );
                        return Err(InventoryError::MergeConflict {
                            id: resource.id.clone(),
                            existing_owner,
                            incoming_owner,
                        });
                    }
                }
            }

            let incoming_ids: HashSet<&str> = incoming.iter().map(|r| r.id.as_str()).collect();
            let before = map.len();
            map.retain(|id, existing| {
                !(existing.account_id == snapshot.account_id
                    && existing.resource_type == resource_type
                    && !incoming_ids.contains(id.as_str()))
            });
            let removed_stale = before - map.len();

            for resource in incoming {
                let mut resource = resource.clone();
                resource.updated_at = snapshot.taken_at;
                if resource.created_at.is_none() {
                    if let Some(existing) = map.get(&resource.id) {
                        resource.created_at = existing.created_at;
                    }
                }
                map.insert(resource.id.clone(), resource);
            }

            debug!(
                account = %snapshot.account_id,
                service = %resource_type,
                upserted = incoming.len(),
                removed_stale,
                "merged snapshot subset"
            );
        }

        Ok(())
    }

    /// All persisted resources (input to the query engine)
    pub async fn all(&self) -> Vec<Resource> {
        self.resources.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.resources.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.resources.read().await.is_empty()
    }

    /// Write the resource set to disk as JSON
    pub async fn save(&self, path: &Path) -> Result<(), InventoryError> {
        let mut resources = self.all().await;
        resources.sort_by(|a, b| a.id.cmp(&b.id));

        let content = serde_json::to_string_pretty(&resources)
            .map_err(|e| InventoryError::Internal(format!("serializing state: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| InventoryError::Internal(format!("creating state directory: {e}")))?;
        }
        std::fs::write(path, content)
            .map_err(|e| InventoryError::Internal(format!("writing state file: {e}")))?;

        Ok(())
    }

    /// Load a resource set from disk; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| InventoryError::Internal(format!("reading state file: {e}")))?;
        let resources: Vec<Resource> = serde_json::from_str(&content)
            .map_err(|e| InventoryError::Internal(format!("parsing state file: {e}")))?;

        let map = resources.into_iter().map(|r| (r.id.clone(), r)).collect();
        Ok(Self {
            resources: RwLock::new(map),
            merge_locks: Mutex::new(HashMap::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn resource(account: &str, resource_type: ResourceType, native_id: &str) -> Resource {
        let region = "us-east-1";
        Resource {
            id: Resource::global_id(resource_type, region, account, native_id),
            account_id: account.to_string(),
            region: region.to_string(),
            resource_type,
            name: native_id.to_string(),
            tags: HashMap::new(),
            status: "running".to_string(),
            attributes: serde_json::Map::new(),
            created_at: None,
            updated_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    fn snapshot(
        account: &str,
        at_secs: i64,
        resources: Vec<(ResourceType, Vec<Resource>)>,
    ) -> CollectionSnapshot {
        CollectionSnapshot {
            account_id: account.to_string(),
            taken_at: Utc.timestamp_opt(at_secs, 0).unwrap(),
            resources: resources.into_iter().collect(),
            errors: Vec::new(),
            auth_failed: false,
        }
    }

    #[tokio::test]
    async fn merge_is_idempotent() {
        let store = ResourceStore::new();
        let snap = snapshot(
            "111111111111",
            100,
            vec![(
                ResourceType::Compute,
                vec![
                    resource("111111111111", ResourceType::Compute, "i-a"),
                    resource("111111111111", ResourceType::Compute, "i-b"),
                ],
            )],
        );

        store.merge(&snap).await.unwrap();
        let first = {
            let mut all = store.all().await;
            all.sort_by(|a, b| a.id.cmp(&b.id));
            all
        };

        store.merge(&snap).await.unwrap();
        let second = {
            let mut all = store.all().await;
            all.sort_by(|a, b| a.id.cmp(&b.id));
            all
        };

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn stale_resources_are_removed_on_successful_refetch() {
        let store = ResourceStore::new();
        store
            .merge(&snapshot(
                "111111111111",
                100,
                vec![(
                    ResourceType::Compute,
                    vec![
                        resource("111111111111", ResourceType::Compute, "i-a"),
                        resource("111111111111", ResourceType::Compute, "i-b"),
                    ],
                )],
            ))
            .await
            .unwrap();

        store
            .merge(&snapshot(
                "111111111111",
                200,
                vec![(
                    ResourceType::Compute,
                    vec![resource("111111111111", ResourceType::Compute, "i-a")],
                )],
            ))
            .await
            .unwrap();

        let all = store.all().await;
        assert_eq!(all.len(), 1);
        assert!(all[0].id.ends_with(":i-a"));
    }

    #[tokio::test]
    async fn failed_type_is_left_completely_untouched() {
        let store = ResourceStore::new();
        store
            .merge(&snapshot(
                "111111111111",
                100,
                vec![
                    (
                        ResourceType::Compute,
                        vec![resource("111111111111", ResourceType::Compute, "i-a")],
                    ),
                    (
                        ResourceType::Database,
                        vec![resource("111111111111", ResourceType::Database, "db-1")],
                    ),
                ],
            ))
            .await
            .unwrap();

        let database_before: Vec<Resource> = store
            .all()
            .await
            .into_iter()
            .filter(|r| r.resource_type == ResourceType::Database)
            .collect();

        // Cycle 2: compute succeeds with new data, database failed (absent
        // from the snapshot's resources map entirely).
        store
            .merge(&snapshot(
                "111111111111",
                200,
                vec![(
                    ResourceType::Compute,
                    vec![resource("111111111111", ResourceType::Compute, "i-c")],
                )],
            ))
            .await
            .unwrap();

        let database_after: Vec<Resource> = store
            .all()
            .await
            .into_iter()
            .filter(|r| r.resource_type == ResourceType::Database)
            .collect();
        assert_eq!(database_before, database_after);

        let compute: Vec<Resource> = store
            .all()
            .await
            .into_iter()
            .filter(|r| r.resource_type == ResourceType::Compute)
            .collect();
        assert_eq!(compute.len(), 1);
        assert!(compute[0].id.ends_with(":i-c"));
    }

    #[tokio::test]
    async fn all_failed_snapshot_changes_nothing() {
        let store = ResourceStore::new();
        store
            .merge(&snapshot(
                "111111111111",
                100,
                vec![(
                    ResourceType::Compute,
                    vec![resource("111111111111", ResourceType::Compute, "i-a")],
                )],
            ))
            .await
            .unwrap();

        // Auth failure: nothing was successfully fetched.
        store
            .merge(&snapshot("111111111111", 200, vec![]))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn merges_are_scoped_to_their_own_account() {
        let store = ResourceStore::new();
        store
            .merge(&snapshot(
                "111111111111",
                100,
                vec![(
                    ResourceType::Compute,
                    vec![resource("111111111111", ResourceType::Compute, "i-a")],
                )],
            ))
            .await
            .unwrap();
        store
            .merge(&snapshot(
                "222222222222",
                200,
                vec![(
                    ResourceType::Compute,
                    vec![resource("222222222222", ResourceType::Compute, "i-z")],
                )],
            ))
            .await
            .unwrap();

        // An empty successful compute fetch for account 2 must not disturb
        // account 1.
        store
            .merge(&snapshot(
                "222222222222",
                300,
                vec![(ResourceType::Compute, vec![])],
            ))
            .await
            .unwrap();

        let all = store.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].account_id, "111111111111");
    }

    #[tokio::test]
    async fn update_bumps_timestamp_and_keeps_creation_time() {
        let store = ResourceStore::new();
        let mut first = resource("111111111111", ResourceType::Compute, "i-a");
        first.created_at = Some(Utc.timestamp_opt(50, 0).unwrap());
        store
            .merge(&snapshot(
                "111111111111",
                100,
                vec![(ResourceType::Compute, vec![first])],
            ))
            .await
            .unwrap();

        // Second observation lacks a creation time.
        store
            .merge(&snapshot(
                "111111111111",
                200,
                vec![(
                    ResourceType::Compute,
                    vec![resource("111111111111", ResourceType::Compute, "i-a")],
                )],
            ))
            .await
            .unwrap();

        let all = store.all().await;
        assert_eq!(all[0].updated_at, Utc.timestamp_opt(200, 0).unwrap());
        assert_eq!(all[0].created_at, Some(Utc.timestamp_opt(50, 0).unwrap()));
    }

    #[tokio::test]
    async fn cross_owner_identifier_collision_is_a_merge_conflict() {
        let store = ResourceStore::new();
        store
            .merge(&snapshot(
                "111111111111",
                100,
                vec![(
                    ResourceType::Compute,
                    vec![resource("111111111111", ResourceType::Compute, "i-a")],
                )],
            ))
            .await
            .unwrap();

        // Same identifier claimed by a different account: id construction
        // must have broken somewhere.
        let mut stolen = resource("222222222222", ResourceType::Compute, "i-x");
        stolen.id = Resource::global_id(ResourceType::Compute, "us-east-1", "111111111111", "i-a");
        let err = store
            .merge(&snapshot(
                "222222222222",
                200,
                vec![(ResourceType::Compute, vec![stolen])],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::MergeConflict { .. }));
        // The conflicting subset must not have been applied.
        let all = store.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].account_id, "111111111111");
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let store = ResourceStore::new();
        store
            .merge(&snapshot(
                "111111111111",
                100,
                vec![(
                    ResourceType::Compute,
                    vec![
                        resource("111111111111", ResourceType::Compute, "i-a"),
                        resource("111111111111", ResourceType::Compute, "i-b"),
                    ],
                )],
            ))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        store.save(&path).await.unwrap();

        let reloaded = ResourceStore::load(&path).unwrap();
        assert_eq!(reloaded.len().await, 2);

        let mut original = store.all().await;
        let mut restored = reloaded.all().await;
        original.sort_by(|a, b| a.id.cmp(&b.id));
        restored.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(original, restored);
    }

    #[tokio::test]
    async fn loading_a_missing_file_gives_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.len().await, 0);
    }
}
