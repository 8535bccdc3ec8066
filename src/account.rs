//! Account descriptors and the account source seam
//!
//! The engine only reads accounts; who stores them and how is the caller's
//! concern. The bundled implementation is backed by the local config file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One cloud account the inventory covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDescriptor {
    pub id: String,
    pub name: String,
    /// Primary region fetchers run against.
    pub region: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Opaque reference resolved by the credential provider.
    pub credential_ref: String,
}

fn default_active() -> bool {
    true
}

/// Where the engine gets its account roster from.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn list_active_accounts(&self) -> anyhow::Result<Vec<AccountDescriptor>>;
}

/// Account roster read from the configuration file.
pub struct ConfigAccountSource {
    accounts: Vec<AccountDescriptor>,
}

impl ConfigAccountSource {
    pub fn new(accounts: Vec<AccountDescriptor>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl AccountSource for ConfigAccountSource {
    async fn list_active_accounts(&self) -> anyhow::Result<Vec<AccountDescriptor>> {
        Ok(self.accounts.iter().filter(|a| a.active).cloned().collect())
    }
}
