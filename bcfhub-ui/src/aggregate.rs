//! Flattened issue list across all registered archives
//!
//! The aggregate is derived, never edited: concatenation of each archive's
//! issues in registration order, intra-archive order preserved. No
//! deduplication is performed; equal GUIDs from different archives both
//! appear.

use crate::registry::Registry;
use bcfhub_common::Issue;

/// Concatenate every archive's issues in registration order
pub fn aggregate(registry: &Registry) -> Vec<Issue> {
    let total = registry.iter().map(|a| a.issues.len()).sum();
    let mut issues = Vec::with_capacity(total);
    for archive in registry.iter() {
        issues.extend(archive.issues.iter().cloned());
    }
    issues
}

/// Find an issue by provenance and GUID
///
/// GUIDs are unique within an archive, so `(archive, guid)` identifies at
/// most one issue.
pub fn find_issue<'a>(issues: &'a [Issue], archive: &str, guid: &str) -> Option<&'a Issue> {
    issues
        .iter()
        .find(|issue| issue.archive == archive && issue.guid == guid)
}
