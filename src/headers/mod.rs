//! Ordered, case-insensitive header storage.
//!
//! [`HeaderMap`] backs both the outgoing request headers assembled by the
//! request builder and the response headers handed back by the transport.
//! Structured header values (`content-disposition` and friends) are decoded
//! by [`parse_header_value`].

mod value;

pub use value::{ParsedHeaderValue, parse_header_value};

use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

impl HeaderEntry {
    fn new(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            values: vec![value],
        }
    }
}

/// Header name to one-or-more values, keyed case-insensitively.
///
/// Entries keep the position at which their name was first inserted. The
/// spelling reported by [`entries`](Self::entries) is the one used by the most
/// recent `set` (or the first `append`) for that name.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: IndexMap<String, HeaderEntry>,
}

impl HeaderMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when any value is stored under `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns all values for `name` joined by `", "`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|entry| entry.values.join(", "))
    }

    /// Replaces every value stored under `name`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        // insert on an existing key keeps its position
        self.entries
            .insert(name.to_ascii_lowercase(), HeaderEntry::new(name, value.into()));
    }

    /// Adds another value under `name`, keeping the existing ones.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.get_mut(&name.to_ascii_lowercase()) {
            Some(entry) => entry.values.push(value),
            None => {
                self.entries
                    .insert(name.to_ascii_lowercase(), HeaderEntry::new(name, value));
            }
        }
    }

    /// Returns `(name, combined value)` pairs in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .values()
            .map(|entry| (entry.name.clone(), entry.values.join(", ")))
            .collect()
    }

    /// Iterates every individual `(name, value)` pair, one per stored value.
    pub fn iter_values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().flat_map(|entry| {
            entry
                .values
                .iter()
                .map(move |value| (entry.name.as_str(), value.as_str()))
        })
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
