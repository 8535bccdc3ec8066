//! HTTP utilities for provider REST API calls

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Strips non-printable characters and truncates long responses
fn sanitize_for_log(body: &str) -> String {
    let stripped: String = body
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    if stripped.len() > MAX_LOG_BODY_LENGTH {
        let truncated: String = stripped.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", truncated, body.len())
    } else {
        stripped
    }
}

/// HTTP client wrapper for provider API calls
#[derive(Clone)]
pub struct ProviderHttpClient {
    client: Client,
}

impl ProviderHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("stratus/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a provider API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only log sanitized/truncated error bodies
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!("API request failed: {}", status));
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format a provider API error for reports and logs
/// Maps common HTTP statuses to stable messages without exposing raw API details
pub fn format_provider_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    if error_str.contains("403") {
        return "Permission denied by provider".to_string();
    }
    if error_str.contains("401") {
        return "Provider rejected the credentials".to_string();
    }
    if error_str.contains("404") {
        return "Service endpoint not found".to_string();
    }
    if error_str.contains("429") {
        return "Provider rate limit exceeded".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "Provider service temporarily unavailable".to_string();
    }

    // Truncate anything else and strip potential sensitive data
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
