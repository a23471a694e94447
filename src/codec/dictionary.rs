//! Run-scoped string interning dictionary.
//!
//! Every distinct string value encoded during one export run is assigned a
//! stable 0-based index in first-occurrence order, shared across all fields
//! and all rows. Index `0xFFFF_FFFF` is never assigned: the wire format
//! reserves it as the inline-definition sentinel.

use std::collections::HashMap;

use crate::errors::{EncodeError, EncodeResult};

/// Insertion-ordered set of previously seen strings.
///
/// Created empty at the start of an export run, owned by that run's encoder,
/// and discarded with it. Indices from one run are meaningless in any other.
#[derive(Debug, Default)]
pub struct StringDictionary {
    indices: HashMap<String, u32>,
}

impl StringDictionary {
    pub fn new() -> Self {
        Self {
            indices: HashMap::new(),
        }
    }

    /// Return the first-occurrence index of `value`, if it has one. Pure
    /// query: equality is exact string content, never identity.
    pub fn lookup(&self, value: &str) -> Option<u32> {
        self.indices.get(value).copied()
    }

    /// Append `value` as a new entry and return its index (== the prior
    /// entry count). Callers confirm absence via [`lookup`](Self::lookup)
    /// first; inserting a string twice would orphan its original index.
    pub fn insert(&mut self, value: &str) -> EncodeResult<u32> {
        let index = next_index(self.indices.len())?;
        self.indices.insert(value.to_string(), index);
        Ok(index)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Index the next entry would take, given the current entry count.
///
/// The 2^32-th entry would take the sentinel value as its index, so the
/// highest index a dictionary ever assigns is `0xFFFF_FFFE`.
fn next_index(len: usize) -> EncodeResult<u32> {
    if len >= u32::MAX as usize {
        return Err(EncodeError::DictionaryOverflow);
    }
    Ok(len as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_dense_indices_from_zero() {
        let mut dict = StringDictionary::new();
        assert_eq!(dict.insert("Alice").unwrap(), 0);
        assert_eq!(dict.insert("Bob").unwrap(), 1);
        assert_eq!(dict.insert("Carol").unwrap(), 2);
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_lookup_finds_first_occurrence_index() {
        let mut dict = StringDictionary::new();
        dict.insert("Alice").unwrap();
        dict.insert("Bob").unwrap();

        assert_eq!(dict.lookup("Alice"), Some(0));
        assert_eq!(dict.lookup("Bob"), Some(1));
        assert_eq!(dict.lookup("Carol"), None);
    }

    #[test]
    fn test_lookup_does_not_mutate() {
        let dict = StringDictionary::new();
        assert_eq!(dict.lookup("anything"), None);
        assert!(dict.is_empty());
    }

    #[test]
    fn test_equality_is_by_content() {
        let mut dict = StringDictionary::new();
        let owned = String::from("Hello");
        dict.insert(&owned).unwrap();

        // A different allocation with the same content resolves to the
        // same index.
        let other = "Hel".to_string() + "lo";
        assert_eq!(dict.lookup(&other), Some(0));
    }

    #[test]
    fn test_unicode_entries() {
        let mut dict = StringDictionary::new();
        assert_eq!(dict.insert("\u{540d}\u{524d}").unwrap(), 0);
        assert_eq!(dict.lookup("\u{540d}\u{524d}"), Some(0));
    }

    #[test]
    fn test_next_index_stops_before_sentinel() {
        // 0xFFFF_FFFE is the last index distinguishable from the inline
        // sentinel; one more entry must fail instead of colliding with it.
        assert_eq!(next_index(0xFFFF_FFFE).unwrap(), 0xFFFF_FFFE);
        assert_eq!(next_index(0xFFFF_FFFF), Err(EncodeError::DictionaryOverflow));
    }
}
