//! Wire models for Azure Resource Manager responses

use serde::{Deserialize, Serialize};

/// `GET /subscriptions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Enabled, Warned, PastDue, Disabled, Deleted
    #[serde(default)]
    pub state: Option<String>,
}

/// One entry of `GET /subscriptions/{id}/providers`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub namespace: String,
    #[serde(default)]
    pub registration_state: Option<String>,
}

/// One page of providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderListResult {
    #[serde(default)]
    pub value: Vec<Provider>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Error envelope returned by the management API
#[derive(Debug, Clone, Deserialize)]
pub struct ArmErrorResponse {
    pub error: ArmError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArmError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ArmError {
    /// Parse an error body, falling back to the raw text
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ArmErrorResponse>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => Self {
                code: String::new(),
                message: body.trim().to_string(),
            },
        }
    }
}

impl std::fmt::Display for ArmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.code, self.message),
            (false, true) => f.write_str(&self.code),
            (true, false) => f.write_str(&self.message),
            (true, true) => f.write_str("no error details"),
        }
    }
}

/// Token endpoint response for the client-credentials grant
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Output of `az account get-access-token --output json`
#[derive(Debug, Clone, Deserialize)]
pub struct CliTokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    /// Unix timestamp, newer CLI versions only
    #[serde(default)]
    pub expires_on: Option<i64>,
    /// Local time, e.g. `2024-05-01 13:45:10.000000`
    #[serde(rename = "expiresOn", default)]
    pub expires_on_local: Option<String>,
}
