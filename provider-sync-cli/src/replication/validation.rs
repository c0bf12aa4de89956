//! Entry validation for a replication run

use std::fmt;

use uuid::Uuid;

use super::error::{ReplicationError, ReplicationResult};
use super::strategy::ReplicationStrategy;

/// A subscription identifier that parsed as a UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Accepts the usual textual UUID forms (hyphenated, simple, braced, urn)
    ///
    /// Surrounding whitespace is not stripped.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::try_parse(value).ok().map(Self)
    }
}

/// Lowercase hyphenated form, as the management API expects it in paths
impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Inputs for one run, checked and resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationRequest {
    pub source: SubscriptionId,
    pub destination: SubscriptionId,
    pub strategy: ReplicationStrategy,
}

/// Validate raw subscription identifiers and resolve the strategy name
///
/// Checks run in a fixed order so the reported error is deterministic:
/// identical identifiers, source format, destination format, strategy.
pub fn validate_request(
    source_id: &str,
    destination_id: &str,
    strategy_name: Option<&str>,
) -> ReplicationResult<ReplicationRequest> {
    if source_id == destination_id {
        return Err(ReplicationError::IdenticalSubscriptions);
    }

    let source = SubscriptionId::parse(source_id)
        .ok_or_else(|| ReplicationError::InvalidSource(source_id.to_string()))?;
    let destination = SubscriptionId::parse(destination_id)
        .ok_or_else(|| ReplicationError::InvalidDestination(destination_id.to_string()))?;

    // Different spellings of the same UUID still name the same subscription
    if source == destination {
        return Err(ReplicationError::IdenticalSubscriptions);
    }

    let strategy = match strategy_name {
        Some(name) => name.parse()?,
        None => ReplicationStrategy::default(),
    };

    Ok(ReplicationRequest {
        source,
        destination,
        strategy,
    })
}
