//! Replication strategies and delta evaluation
//!
//! - `Echo` only ever registers: anything enabled on the source gets enabled
//!   on the destination, nothing is disabled.
//! - `Sync` mirrors the source exactly for every namespace both
//!   subscriptions know about, registering or unregistering as needed.
//!
//! Both strategies iterate the source's namespaces and ignore namespaces the
//! destination does not list. Namespaces only the destination lists are
//! never touched.

use std::fmt;
use std::str::FromStr;

use super::delta::RegistrationDelta;
use super::error::ReplicationError;
use super::snapshot::RegistrationSnapshot;

/// How the destination subscription should be brought in line with the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReplicationStrategy {
    /// Register what the source has registered, never unregister
    #[default]
    Echo,
    /// Make shared namespaces match the source exactly
    Sync,
}

impl ReplicationStrategy {
    pub const ALL: [ReplicationStrategy; 2] = [Self::Echo, Self::Sync];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for ReplicationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the strategy's token
impl FromStr for ReplicationStrategy {
    type Err = ReplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| ReplicationError::UnsupportedStrategy(s.to_string()))
    }
}

/// Compute the changes the destination needs under `strategy`
pub fn evaluate(
    source: &RegistrationSnapshot,
    destination: &RegistrationSnapshot,
    strategy: ReplicationStrategy,
) -> RegistrationDelta {
    let mut delta = RegistrationDelta::new();

    for (namespace, enabled) in source.iter() {
        let Some(current) = destination.get(namespace) else {
            continue;
        };

        match strategy {
            ReplicationStrategy::Echo => {
                if enabled && !current {
                    delta.insert(namespace, true);
                }
            }
            ReplicationStrategy::Sync => {
                if enabled != current {
                    delta.insert(namespace, enabled);
                }
            }
        }
    }

    log::debug!(
        "Evaluated {} strategy over {} source / {} destination providers: {} change(s)",
        strategy,
        source.len(),
        destination.len(),
        delta.len()
    );

    delta
}

/// Like [`evaluate`], resolving the strategy from its name first
pub fn evaluate_named(
    source: &RegistrationSnapshot,
    destination: &RegistrationSnapshot,
    strategy_name: &str,
) -> Result<RegistrationDelta, ReplicationError> {
    let strategy = strategy_name.parse()?;
    Ok(evaluate(source, destination, strategy))
}
