//! Credential handling
//!
//! Credentials are opaque to the engine: a [`CredentialProvider`] resolves an
//! account's credential reference into token material, and a caching layer
//! keeps resolved tokens warm so repeated collection cycles don't hammer the
//! backing secret source.

use crate::account::AccountDescriptor;
use crate::error::InventoryError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL when the backing source reports none (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Opaque credential material for one account.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token material stays out of logs
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Resolves an account's credential reference to usable credentials.
///
/// Injected into the collector; its lifecycle and storage belong to the
/// caller, not the engine.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_credentials(
        &self,
        account: &AccountDescriptor,
    ) -> Result<Credentials, InventoryError>;
}

/// Credential source backed by a keyed secret map, with an environment
/// override per reference (`STRATUS_CREDENTIAL_<REF>` wins over the map).
pub struct KeyedCredentialProvider {
    secrets: HashMap<String, String>,
}

impl KeyedCredentialProvider {
    pub fn from_map(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }

    /// Read a JSON object of `{reference: token}` pairs from disk.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        let secrets: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file {}", path.display()))?;
        Ok(Self { secrets })
    }

    fn env_var_name(reference: &str) -> String {
        let suffix: String = reference
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("STRATUS_CREDENTIAL_{suffix}")
    }
}

#[async_trait]
impl CredentialProvider for KeyedCredentialProvider {
    async fn get_credentials(
        &self,
        account: &AccountDescriptor,
    ) -> Result<Credentials, InventoryError> {
        let reference = &account.credential_ref;

        if let Ok(token) = std::env::var(Self::env_var_name(reference)) {
            if !token.is_empty() {
                return Ok(Credentials::new(token));
            }
        }

        match self.secrets.get(reference) {
            Some(token) if !token.is_empty() => Ok(Credentials::new(token.clone())),
            _ => Err(InventoryError::Auth {
                account_id: account.id.clone(),
                message: format!("no credentials found for reference '{reference}'"),
            }),
        }
    }
}

struct CachedCredentials {
    credentials: Credentials,
    /// When these credentials expire (with buffer applied)
    expires_at: Instant,
}

impl CachedCredentials {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Caching wrapper in front of any credential provider, keyed by account.
pub struct CachingCredentialProvider<P> {
    inner: P,
    cache: RwLock<HashMap<String, CachedCredentials>>,
}

impl<P: CredentialProvider> CachingCredentialProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<P: CredentialProvider> CredentialProvider for CachingCredentialProvider<P> {
    async fn get_credentials(
        &self,
        account: &AccountDescriptor,
    ) -> Result<Credentials, InventoryError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&account.id) {
                if cached.is_valid() {
                    return Ok(cached.credentials.clone());
                }
                tracing::debug!(account = %account.id, "cached credentials expired, fetching new ones");
            }
        }

        let credentials = self.inner.get_credentials(account).await?;
        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                account.id.clone(),
                CachedCredentials {
                    credentials: credentials.clone(),
                    expires_at,
                },
            );
        }

        Ok(credentials)
    }
}
