//! Ordered, case-insensitively unique tag collection.

use std::collections::HashSet;

use serde::{Serialize, Serializer};

/// Tags in first-seen order; two tags equal ignoring case are the same tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
    seen: HashSet<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, trimming it first. Returns true if it was new.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        if self.seen.insert(tag.to_lowercase()) {
            self.tags.push(tag.to_string());
            true
        } else {
            false
        }
    }

    /// Insert every tag from an iterator, returning how many were new.
    pub fn extend<I, S>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .filter(|t| self.insert(t.as_ref()))
            .count()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.seen.contains(&tag.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tags
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        set.extend(iter);
        set
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tags.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_dedup_keeps_first_spelling() {
        let mut tags = TagSet::new();
        assert!(tags.insert("3DCG"));
        assert!(!tags.insert("3dcg"));
        assert!(tags.insert("Male protagonist"));
        assert!(!tags.insert("  male PROTAGONIST "));
        assert_eq!(tags.as_slice(), &["3DCG", "Male protagonist"]);
    }

    #[test]
    fn test_extend_counts_new_only() {
        let mut tags: TagSet = ["sandbox", "romance"].into_iter().collect();
        let added = tags.extend(["Romance", "humor", ""]);
        assert_eq!(added, 1);
        assert_eq!(tags.len(), 3);
        assert!(tags.contains("HUMOR"));
    }

    #[test]
    fn test_serializes_as_array() {
        let tags: TagSet = ["a", "b"].into_iter().collect();
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["a","b"]"#);
    }
}
