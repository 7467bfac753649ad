//! Focused issue for detail inspection
//!
//! The selection holds a value copy, not a reference into the registry.
//! Removing or re-registering the source archive does not clear it; the
//! copied issue stays readable until it is replaced or the workspace is
//! cleared. The registration it was copied from is kept alongside so
//! callers can tell whether that registration is still current.

use bcfhub_common::Issue;

use crate::registry::Generation;

/// Copied issue plus the registration of its archive at selection time
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedIssue {
    pub issue: Issue,
    pub source: Generation,
}

#[derive(Debug, Default, Clone)]
pub struct Selection {
    current: Option<SelectedIssue>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `issue`, taken from the `source` registration of its archive
    pub fn select(&mut self, issue: Issue, source: Generation) {
        self.current = Some(SelectedIssue { issue, source });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&SelectedIssue> {
        self.current.as_ref()
    }
}
