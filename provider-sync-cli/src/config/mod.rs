//! Process configuration
//!
//! Resolved once at start-up from the environment (after `.env` loading) and
//! handed to the API layer. Nothing here performs network calls.

use std::time::Duration;

use anyhow::{Result, bail};

pub const ARM_ENVIRONMENT_VAR: &str = "ARM_ENVIRONMENT";
pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
pub const HTTP_TIMEOUT_VAR: &str = "PROVIDER_SYNC_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Azure cloud the tool talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloudEnvironment {
    #[default]
    Public,
    UsGovernment,
}

impl CloudEnvironment {
    /// `usgovernment` selects the government cloud, anything else is public
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("usgovernment") => Self::UsGovernment,
            _ => Self::Public,
        }
    }

    pub fn authority_host(&self) -> &'static str {
        match self {
            Self::Public => "https://login.microsoftonline.com",
            Self::UsGovernment => "https://login.microsoftonline.us",
        }
    }

    pub fn resource_manager(&self) -> &'static str {
        match self {
            Self::Public => "https://management.azure.com",
            Self::UsGovernment => "https://management.usgovcloudapi.net",
        }
    }

    /// OAuth scope covering the resource manager
    pub fn scope(&self) -> String {
        format!("{}/.default", self.resource_manager())
    }
}

/// Where bearer tokens come from
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Service principal, OAuth2 client-credentials grant
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Whatever account `az login` left behind
    AzureCli,
}

impl CredentialSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientSecret { .. } => "client secret",
            Self::AzureCli => "azure cli",
        }
    }
}

// Keep the secret out of debug logs
impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Self::AzureCli => f.write_str("AzureCli"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cloud: CloudEnvironment,
    pub credentials: CredentialSource,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let cloud = CloudEnvironment::from_name(var(ARM_ENVIRONMENT_VAR).as_deref());

        let credentials = match (var(TENANT_ID_VAR), var(CLIENT_ID_VAR), var(CLIENT_SECRET_VAR)) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                CredentialSource::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                }
            }
            (None, None, None) => CredentialSource::AzureCli,
            (tenant, client, secret) => {
                let missing: Vec<&str> = [
                    (TENANT_ID_VAR, tenant.is_none()),
                    (CLIENT_ID_VAR, client.is_none()),
                    (CLIENT_SECRET_VAR, secret.is_none()),
                ]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(name, _)| name)
                .collect();
                bail!(
                    "Incomplete service principal configuration, missing: {}",
                    missing.join(", ")
                );
            }
        };

        let http_timeout = match var(HTTP_TIMEOUT_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => bail!("{} must be a positive number of seconds, got '{}'", HTTP_TIMEOUT_VAR, raw),
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let config = Self {
            cloud,
            credentials,
            http_timeout,
        };
        log::debug!(
            "Resolved configuration: cloud={:?}, credentials={}, timeout={:?}",
            config.cloud,
            config.credentials.kind(),
            config.http_timeout
        );
        Ok(config)
    }
}
