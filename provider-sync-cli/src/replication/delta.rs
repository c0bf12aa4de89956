//! Registration delta and its human-readable report

use std::collections::BTreeMap;

/// Extra columns between the widest namespace and the arrow
const NAMESPACE_MARGIN: usize = 5;

/// Namespace → desired registered flag for the destination
///
/// Only namespaces that need a change are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDelta {
    changes: BTreeMap<String, bool>,
}

impl RegistrationDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, namespace: impl Into<String>, desired: bool) {
        self.changes.insert(namespace.into(), desired);
    }

    pub fn get(&self, namespace: &str) -> Option<bool> {
        self.changes.get(namespace).copied()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes in namespace order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn registrations(&self) -> usize {
        self.changes.values().filter(|v| **v).count()
    }

    pub fn unregistrations(&self) -> usize {
        self.changes.values().filter(|v| !**v).count()
    }

    /// Column-aligned listing, one line per namespace
    ///
    /// Namespaces are padded to the widest name plus a fixed margin.
    /// An empty delta produces an empty string.
    pub fn report(&self) -> String {
        let width = match self.changes.keys().map(|k| k.len()).max() {
            Some(longest) => longest + NAMESPACE_MARGIN,
            None => return String::new(),
        };

        self.changes
            .iter()
            .map(|(namespace, desired)| {
                format!(
                    "{:<width$} => {}",
                    namespace,
                    action_label(*desired),
                    width = width
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Verb shown for a desired state
pub fn action_label(desired: bool) -> &'static str {
    if desired { "Register" } else { "Unregister" }
}

impl<S: Into<String>> FromIterator<(S, bool)> for RegistrationDelta {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Self {
            changes: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
