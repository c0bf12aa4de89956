//! Bearer token acquisition for the resource manager
//!
//! Tokens come from either a service principal (client-credentials grant)
//! or the Azure CLI, and are cached until shortly before they expire.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::process::Command;
use tokio::sync::Mutex;

use super::constants::{AZURE_CLI, DEFAULT_TOKEN_LIFETIME_SECS, TOKEN_REFRESH_MARGIN_SECS};
use super::models::{ArmError, CliTokenResponse, TokenResponse};
use crate::config::{CloudEnvironment, CredentialSource};

/// A bearer token and when it stops working
#[derive(Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenInfo {
    /// Usable at `now` with the refresh margin to spare
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now
    }
}

impl std::fmt::Debug for TokenInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenInfo")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub struct AuthManager {
    cloud: CloudEnvironment,
    credentials: CredentialSource,
    http: Client,
    timeout: Duration,
    cached: Mutex<Option<TokenInfo>>,
}

impl AuthManager {
    pub fn new(
        cloud: CloudEnvironment,
        credentials: CredentialSource,
        http: Client,
        timeout: Duration,
    ) -> Self {
        Self {
            cloud,
            credentials,
            http,
            timeout,
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, reusing the cached one while it is fresh
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
            log::debug!("Cached token expires at {}, refreshing", token.expires_at);
        }

        let token = match &self.credentials {
            CredentialSource::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => self.client_secret_token(tenant_id, client_id, client_secret).await?,
            CredentialSource::AzureCli => self.azure_cli_token().await?,
        };

        log::info!(
            "Acquired {} token valid until {}",
            self.credentials.kind(),
            token.expires_at
        );
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn client_secret_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenInfo> {
        let url = token_endpoint(self.cloud, tenant_id);
        let body = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}&scope={}",
            urlencoding::encode(client_id),
            urlencoding::encode(client_secret),
            urlencoding::encode(&self.cloud.scope())
        );

        log::debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Failed to reach token endpoint {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!(
                "Token request for client {} failed with HTTP {}: {}",
                client_id,
                status,
                describe_token_error(&text)
            );
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Invalid token endpoint response")?;

        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Ok(TokenInfo {
            access_token: token.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        })
    }

    async fn azure_cli_token(&self) -> Result<TokenInfo> {
        let resource = self.cloud.resource_manager();
        log::debug!("Requesting token from Azure CLI for {}", resource);

        let output = Command::new(AZURE_CLI)
            .args(["account", "get-access-token", "--resource", resource, "--output", "json"])
            .output()
            .await
            .context("Failed to run the Azure CLI; install it and run 'az login', or set AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Azure CLI could not provide a token: {}", stderr.trim());
        }

        let token: CliTokenResponse =
            serde_json::from_slice(&output.stdout).context("Invalid Azure CLI token output")?;
        let expires_at = cli_token_expiry(&token);

        Ok(TokenInfo {
            access_token: token.access_token,
            expires_at,
        })
    }
}

pub fn token_endpoint(cloud: CloudEnvironment, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        cloud.authority_host(),
        urlencoding::encode(tenant_id)
    )
}

/// Pull `error_description` out of an OAuth error body when there is one
fn describe_token_error(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error_description")
                .and_then(|d| d.as_str())
                .map(|d| d.lines().next().unwrap_or_default().to_string())
        })
        .unwrap_or_else(|| ArmError::from_body(body).to_string())
}

/// Expiry from CLI output: the unix timestamp if present, else the local time string
fn cli_token_expiry(token: &CliTokenResponse) -> DateTime<Utc> {
    if let Some(ts) = token.expires_on {
        if let Some(at) = DateTime::from_timestamp(ts, 0) {
            return at;
        }
    }

    token
        .expires_on_local
        .as_deref()
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| {
            log::warn!("Azure CLI token has no readable expiry, assuming default lifetime");
            Utc::now() + chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(secs: i64) -> TokenInfo {
        TokenInfo {
            access_token: "token".to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(secs),
        }
    }

    #[test]
    fn test_token_freshness_respects_margin() {
        let now = Utc::now();
        assert!(token_expiring_in(3600).is_fresh(now));
        assert!(!token_expiring_in(TOKEN_REFRESH_MARGIN_SECS - 10).is_fresh(now));
        assert!(!token_expiring_in(-1).is_fresh(now));
    }

    #[test]
    fn test_token_endpoint_per_cloud() {
        assert_eq!(
            token_endpoint(CloudEnvironment::Public, "contoso.onmicrosoft.com"),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/token"
        );
        assert_eq!(
            token_endpoint(CloudEnvironment::UsGovernment, "tenant"),
            "https://login.microsoftonline.us/tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_cli_expiry_prefers_timestamp() {
        let token = CliTokenResponse {
            access_token: "t".to_string(),
            expires_on: Some(1714563910),
            expires_on_local: Some("1999-01-01 00:00:00.000000".to_string()),
        };
        assert_eq!(cli_token_expiry(&token).timestamp(), 1714563910);
    }

    #[test]
    fn test_cli_expiry_falls_back_to_local_time() {
        let token = CliTokenResponse {
            access_token: "t".to_string(),
            expires_on: None,
            expires_on_local: Some("2030-06-15 08:30:00.000000".to_string()),
        };
        let expected = Local
            .with_ymd_and_hms(2030, 6, 15, 8, 30, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(cli_token_expiry(&token), expected);
    }

    #[test]
    fn test_describe_token_error() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided.\r\nTrace ID: abc"}"#;
        assert_eq!(
            describe_token_error(body),
            "AADSTS7000215: Invalid client secret provided."
        );
        assert_eq!(describe_token_error("bad gateway"), "bad gateway");
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", token_expiring_in(60));
        assert!(!rendered.contains("\"token\""));
        assert!(rendered.contains("<redacted>"));
    }
}
