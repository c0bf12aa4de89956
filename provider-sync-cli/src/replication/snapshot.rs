//! Registration snapshots
//!
//! A snapshot is the complete namespace → registered mapping for one
//! subscription, read at one instant. Transitional provider states are
//! collapsed to the state the provider is in *right now*.

use std::collections::BTreeMap;
use std::fmt;

/// Registration state as reported by the resource manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Registered,
    Registering,
    Unregistering,
    NotRegistered,
    Unregistered,
    Other(String),
}

impl RegistrationState {
    pub fn parse(value: &str) -> Self {
        match value {
            "Registered" => Self::Registered,
            "Registering" => Self::Registering,
            "Unregistering" => Self::Unregistering,
            "NotRegistered" => Self::NotRegistered,
            "Unregistered" => Self::Unregistered,
            other => Self::Other(other.to_string()),
        }
    }

    /// Current boolean value, ignoring where a transition is heading
    ///
    /// `Registering` has not finished yet, so it still counts as off;
    /// `Unregistering` is still on until it completes.
    pub fn is_registered(&self) -> bool {
        match self {
            Self::Registered | Self::Unregistering => true,
            Self::Registering | Self::NotRegistered | Self::Unregistered => false,
            Self::Other(state) => {
                log::warn!("Unknown provider registration state '{}', treating as not registered", state);
                false
            }
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => f.write_str("Registered"),
            Self::Registering => f.write_str("Registering"),
            Self::Unregistering => f.write_str("Unregistering"),
            Self::NotRegistered => f.write_str("NotRegistered"),
            Self::Unregistered => f.write_str("Unregistered"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Immutable mapping of provider namespace → registered flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    registrations: BTreeMap<String, bool>,
}

impl RegistrationSnapshot {
    /// Build a snapshot from provider listing entries
    ///
    /// Empty namespaces are dropped. If a namespace appears twice the first
    /// occurrence wins.
    pub fn from_states<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = (S, RegistrationState)>,
        S: Into<String>,
    {
        let mut registrations = BTreeMap::new();
        for (namespace, state) in providers {
            let namespace = namespace.into();
            if namespace.is_empty() {
                log::debug!("Skipping provider entry with empty namespace");
                continue;
            }
            if registrations.contains_key(&namespace) {
                log::warn!("Provider {} listed more than once, keeping first entry", namespace);
                continue;
            }
            registrations.insert(namespace, state.is_registered());
        }
        Self { registrations }
    }

    pub fn get(&self, namespace: &str) -> Option<bool> {
        self.registrations.get(namespace).copied()
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.registrations.contains_key(namespace)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Count of namespaces currently registered
    pub fn registered_count(&self) -> usize {
        self.registrations.values().filter(|v| **v).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.registrations.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for RegistrationSnapshot {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        let mut registrations = BTreeMap::new();
        for (namespace, registered) in iter {
            let namespace = namespace.into();
            if !namespace.is_empty() {
                registrations.entry(namespace).or_insert(registered);
            }
        }
        Self { registrations }
    }
}
