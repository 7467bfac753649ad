//! Archive registry
//!
//! Canonical per-archive state, keyed by archive name. Entries keep the
//! position of their first registration; re-registering a name replaces the
//! entry in place with a fresh placeholder and a new [`Generation`].
//!
//! Every inspection result carries the generation it was started for, so a
//! result that settles after its archive was removed or replaced is detected
//! and dropped instead of resurrecting stale issues.

use bcfhub_common::Issue;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Raw archive bytes, shared cheaply and never mutated
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveContent {
    bytes: Arc<[u8]>,
}

impl ArchiveContent {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ArchiveContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchiveContent({} bytes)", self.bytes.len())
    }
}

/// Identifies one registration of an archive name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registered archive
#[derive(Debug, Clone)]
pub struct Archive {
    pub name: String,
    pub content: ArchiveContent,
    pub issues: Vec<Issue>,
    pub inspected: bool,
    pub generation: Generation,
    pub registered_at: DateTime<Utc>,
}

/// Handle returned by [`Registry::register`], consumed by inspection
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub content: ArchiveContent,
    pub generation: Generation,
    /// True when an existing entry of the same name was replaced
    pub replaced: bool,
}

impl Registration {
    pub fn payload(&self) -> ArchivePayload {
        ArchivePayload {
            name: self.name.clone(),
            content: self.content.clone(),
        }
    }
}

/// Name and bytes of one archive, as sent to the external service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePayload {
    pub name: String,
    pub content: ArchiveContent,
}

/// Result of a guarded apply against the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Result recorded on the current entry
    Applied,
    /// Entry was removed or re-registered since the inspection started
    Stale,
}

/// Ordered map from archive name to [`Archive`]
///
/// Archive counts are small, so a vector with linear lookup keeps
/// registration order without an extra index.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Archive>,
    next_generation: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh placeholder entry for `name` (upsert)
    ///
    /// An existing entry keeps its position but loses its issues and
    /// inspected flag.
    pub fn register(&mut self, name: &str, content: ArchiveContent) -> Registration {
        self.next_generation += 1;
        let generation = Generation(self.next_generation);

        let archive = Archive {
            name: name.to_string(),
            content: content.clone(),
            issues: Vec::new(),
            inspected: false,
            generation,
            registered_at: Utc::now(),
        };

        let replaced = match self.position(name) {
            Some(index) => {
                self.entries[index] = archive;
                true
            }
            None => {
                self.entries.push(archive);
                false
            }
        };

        Registration {
            name: name.to_string(),
            content,
            generation,
            replaced,
        }
    }

    /// Attach inspection results to the entry registered as `generation`
    ///
    /// Returns [`ApplyOutcome::Stale`] without touching anything when the
    /// name is gone or now belongs to a newer registration.
    pub fn apply_inspection_result(
        &mut self,
        name: &str,
        generation: Generation,
        issues: Vec<Issue>,
    ) -> ApplyOutcome {
        match self.current_mut(name, generation) {
            Some(archive) => {
                archive.issues = issues;
                archive.inspected = true;
                ApplyOutcome::Applied
            }
            None => ApplyOutcome::Stale,
        }
    }

    /// Delete the entry for `name`, returning it if present
    pub fn remove(&mut self, name: &str) -> Option<Archive> {
        self.position(name).map(|index| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, name: &str) -> Option<&Archive> {
        self.entries.iter().find(|a| a.name == name)
    }

    /// True if `name` is registered under exactly `generation`
    pub fn is_current(&self, name: &str, generation: Generation) -> bool {
        self.get(name).is_some_and(|a| a.generation == generation)
    }

    /// Archives in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Archive> {
        self.entries.iter()
    }

    /// Snapshot of every archive's name and raw bytes, in registration order
    pub fn payloads(&self) -> Vec<ArchivePayload> {
        self.entries
            .iter()
            .map(|a| ArchivePayload {
                name: a.name.clone(),
                content: a.content.clone(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|a| a.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|a| a.name == name)
    }

    fn current_mut(&mut self, name: &str, generation: Generation) -> Option<&mut Archive> {
        self.entries
            .iter_mut()
            .find(|a| a.name == name && a.generation == generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::issue;

    fn content() -> ArchiveContent {
        ArchiveContent::new(b"PK\x03\x04".to_vec())
    }

    #[test]
    fn test_register_creates_placeholder() {
        let mut registry = Registry::new();
        let reg = registry.register("a.bcf", content());

        assert!(!reg.replaced);
        let archive = registry.get("a.bcf").unwrap();
        assert!(archive.issues.is_empty());
        assert!(!archive.inspected);
        assert_eq!(archive.generation, reg.generation);
        assert_eq!(archive.content.len(), 4);
    }

    #[test]
    fn test_reregister_resets_entry_and_keeps_position() {
        let mut registry = Registry::new();
        let first = registry.register("a.bcf", content());
        registry.register("b.bcf", content());
        registry.apply_inspection_result("a.bcf", first.generation, vec![issue("a.bcf", "1")]);

        let second = registry.register("a.bcf", ArchiveContent::new(vec![1, 2]));

        assert!(second.replaced);
        assert_ne!(first.generation, second.generation);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a.bcf", "b.bcf"]);

        let archive = registry.get("a.bcf").unwrap();
        assert!(archive.issues.is_empty());
        assert!(!archive.inspected);
        assert_eq!(archive.content.len(), 2);
    }

    #[test]
    fn test_apply_for_replaced_generation_is_stale() {
        let mut registry = Registry::new();
        let old = registry.register("a.bcf", content());
        let new = registry.register("a.bcf", content());

        let outcome =
            registry.apply_inspection_result("a.bcf", old.generation, vec![issue("a.bcf", "old")]);

        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(registry.get("a.bcf").unwrap().issues.is_empty());
        assert!(registry.is_current("a.bcf", new.generation));
        assert!(!registry.is_current("a.bcf", old.generation));
    }

    #[test]
    fn test_apply_after_remove_is_noop() {
        let mut registry = Registry::new();
        let reg = registry.register("a.bcf", content());
        assert!(registry.remove("a.bcf").is_some());

        let outcome = registry.apply_inspection_result("a.bcf", reg.generation, vec![]);

        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_missing_returns_none() {
        let mut registry = Registry::new();
        assert!(registry.remove("ghost.bcf").is_none());
    }

    #[test]
    fn test_clear_empties_registry() {
        let mut registry = Registry::new();
        registry.register("a.bcf", content());
        registry.register("b.bcf", content());
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_content_debug_hides_bytes() {
        assert_eq!(format!("{:?}", content()), "ArchiveContent(4 bytes)");
    }
}
