//! Azure Resource Manager API versions and request constants

/// `Microsoft.Resources/subscriptions`
pub const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";

/// `Microsoft.Resources/providers`
pub const PROVIDERS_API_VERSION: &str = "2021-04-01";

/// Refresh tokens this long before they expire
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;

/// Assumed lifetime when a token source does not say
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

pub const USER_AGENT: &str = concat!("provider-sync/", env!("CARGO_PKG_VERSION"));

#[cfg(windows)]
pub const AZURE_CLI: &str = "az.cmd";
#[cfg(not(windows))]
pub const AZURE_CLI: &str = "az";
