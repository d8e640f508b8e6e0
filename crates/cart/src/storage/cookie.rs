//! Cookie header side channel.

use std::sync::{Mutex, PoisonError};

use super::HintSink;
use crate::error::StorageError;

/// A cookie header string (`a=1; b=2`) shared with other page contexts.
///
/// Setting a hint rewrites the matching `name=value` pair in place, or
/// appends a new pair when none exists. Unrelated pairs are left alone.
#[derive(Debug, Default)]
pub struct CookieJar {
    header: Mutex<String>,
}

impl CookieJar {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a jar from an existing cookie header.
    #[must_use]
    pub fn from_header(header: impl Into<String>) -> Self {
        Self {
            header: Mutex::new(header.into()),
        }
    }

    /// Current cookie header.
    #[must_use]
    pub fn header(&self) -> String {
        self.header
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Value of the first pair named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let header = self.header.lock().unwrap_or_else(PoisonError::into_inner);
        pairs(&header)
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

impl HintSink for CookieJar {
    fn set_hint(&self, name: &str, value: &str) -> Result<(), StorageError> {
        if name.is_empty() || name.contains(['=', ';']) || value.contains(';') {
            return Err(StorageError::InvalidKey(name.to_string()));
        }

        let mut header = self.header.lock().unwrap_or_else(PoisonError::into_inner);
        let mut found = false;
        let rewritten: Vec<String> = raw_pairs(&header)
            .map(|raw| {
                if !found && split_pair(raw).0 == name {
                    found = true;
                    format!("{name}={value}")
                } else {
                    raw.to_string()
                }
            })
            .collect();

        *header = rewritten.join("; ");
        if !found {
            if !header.is_empty() {
                header.push_str("; ");
            }
            header.push_str(name);
            header.push('=');
            header.push_str(value);
        }
        Ok(())
    }
}

/// Split a cookie header into trimmed, non-empty `name=value` segments.
fn raw_pairs(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
}

fn split_pair(pair: &str) -> (&str, &str) {
    pair.split_once('=').unwrap_or((pair, ""))
}

/// Split a cookie header into `(name, value)` pairs.
fn pairs(header: &str) -> impl Iterator<Item = (&str, &str)> {
    raw_pairs(header).map(split_pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_to_empty_header() {
        let jar = CookieJar::new();
        jar.set_hint("cart_items_count", "2").unwrap();
        assert_eq!(jar.header(), "cart_items_count=2");
    }

    #[test]
    fn test_appends_after_existing_pairs() {
        let jar = CookieJar::from_header("session=abc");
        jar.set_hint("cart_items_count", "1").unwrap();
        assert_eq!(jar.header(), "session=abc; cart_items_count=1");
    }

    #[test]
    fn test_replaces_existing_pair_in_place() {
        let jar = CookieJar::from_header("a=1; cart_items_count=7; b=2");
        jar.set_hint("cart_items_count", "0").unwrap();
        assert_eq!(jar.header(), "a=1; cart_items_count=0; b=2");
        assert_eq!(jar.get("cart_items_count").as_deref(), Some("0"));
    }

    #[test]
    fn test_similar_names_are_not_touched() {
        let jar = CookieJar::from_header("old_cart_items_count=9");
        jar.set_hint("cart_items_count", "3").unwrap();
        assert_eq!(jar.header(), "old_cart_items_count=9; cart_items_count=3");
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let jar = CookieJar::new();
        assert!(jar.set_hint("a;b", "1").is_err());
        assert!(jar.set_hint("", "1").is_err());
        assert!(jar.set_hint("a", "1; evil=2").is_err());
        assert_eq!(jar.header(), "");
    }
}
