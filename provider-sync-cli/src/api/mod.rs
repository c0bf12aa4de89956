//! Azure Resource Manager access
//!
//! The provider registry the replication core runs against: subscription
//! lookup, provider listing and register/unregister calls, plus the token
//! handling they need. No call is retried.

pub mod auth;
pub mod client;
pub mod constants;
pub mod models;

pub use auth::{AuthManager, TokenInfo};
pub use client::ArmClient;
pub use models::{Provider, ProviderListResult, Subscription};
