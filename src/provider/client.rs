//! Provider Client
//!
//! Combines credential material with the HTTP plumbing and knows how to
//! build service list URLs for a region. One client is created per account
//! per collection cycle, carrying that account's credentials.

use super::auth::Credentials;
use super::http::ProviderHttpClient;
use super::registry::ServiceDef;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Per-account provider client
#[derive(Clone)]
pub struct ProviderClient {
    endpoint: Url,
    http: ProviderHttpClient,
    credentials: Credentials,
}

impl ProviderClient {
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid provider endpoint: {endpoint}"))?;
        let http = ProviderHttpClient::new()?;

        Ok(Self {
            endpoint,
            http,
            credentials,
        })
    }

    /// Build the list URL for a service in a region, with an optional page token
    pub fn service_url(&self, def: &ServiceDef, region: &str, page_token: Option<&str>) -> String {
        let path = def
            .path_template
            .replace("{region}", &urlencoding::encode(region));
        let mut url = format!("{}{}", self.endpoint.as_str().trim_end_matches('/'), path);

        if let Some(token) = page_token {
            url.push_str("?pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        url
    }

    /// Make an authenticated GET request to a provider API
    pub async fn get(&self, url: &str) -> Result<Value> {
        self.http.get(url, self.credentials.token()).await
    }
}
