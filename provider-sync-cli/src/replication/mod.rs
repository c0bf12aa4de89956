//! Provider registration replication
//!
//! Pure delta evaluation plus the run sequencing around it. Everything that
//! talks to the network or the terminal sits behind the [`ProviderRegistry`]
//! and [`Operator`] traits.

pub mod delta;
pub mod error;
pub mod orchestrator;
pub mod snapshot;
pub mod strategy;
pub mod validation;

pub use delta::RegistrationDelta;
pub use error::{ReplicationError, ReplicationResult};
pub use orchestrator::{
    Operator, ProviderRegistry, ReplicationOutcome, SubscriptionHandle, replicate, run,
};
pub use snapshot::{RegistrationSnapshot, RegistrationState};
pub use strategy::{ReplicationStrategy, evaluate, evaluate_named};
pub use validation::{ReplicationRequest, SubscriptionId, validate_request};
