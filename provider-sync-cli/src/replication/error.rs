//! Error taxonomy for a replication run

use thiserror::Error;

/// Errors that terminate a replication run
///
/// Validation variants are raised before any network call. Collaborator
/// failures keep the underlying `anyhow` error as their source so the
/// management API's message reaches the operator unchanged.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("Subscription ID for source and destination must not match!")]
    IdenticalSubscriptions,

    #[error("Source subscription ID '{0}' doesn't appear to be a valid UUID.")]
    InvalidSource(String),

    #[error("Destination subscription ID '{0}' doesn't appear to be a valid UUID.")]
    InvalidDestination(String),

    #[error("Unrecognized replication strategy '{0}' (expected 'echo' or 'sync')")]
    UnsupportedStrategy(String),

    #[error("Failed to look up subscription {subscription}")]
    Lookup {
        subscription: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read provider registrations for subscription {subscription}")]
    Fetch {
        subscription: String,
        #[source]
        source: anyhow::Error,
    },

    /// Namespaces listed in `applied` were changed before the failure and stay changed
    #[error(
        "Failed to apply registration change for {namespace} ({} change(s) already applied{})",
        .applied.len(),
        format_applied(.applied)
    )]
    Apply {
        namespace: String,
        applied: Vec<String>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read operator confirmation")]
    Prompt(#[source] anyhow::Error),
}

impl ReplicationError {
    /// True for errors detected before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::IdenticalSubscriptions
                | Self::InvalidSource(_)
                | Self::InvalidDestination(_)
                | Self::UnsupportedStrategy(_)
        )
    }
}

fn format_applied(applied: &[String]) -> String {
    if applied.is_empty() {
        String::new()
    } else {
        format!(": {}", applied.join(", "))
    }
}

pub type ReplicationResult<T> = Result<T, ReplicationError>;
