//! Replicate Azure resource provider registrations between subscriptions
//!
//! Reads which provider namespaces are registered on a source subscription,
//! compares them with a destination subscription, and after confirmation
//! registers (and, with the `sync` strategy, unregisters) providers on the
//! destination one namespace at a time.

pub mod api;
pub mod cli;
pub mod config;
pub mod replication;
