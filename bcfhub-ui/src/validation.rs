//! Upload and merge validation
//!
//! Checks run before any state mutation or service call; a rejected
//! archive leaves the workspace untouched.

use thiserror::Error;

/// Archive file extensions accepted for upload (compared case-insensitively)
pub const ACCEPTED_EXTENSIONS: &[&str] = &["bcf", "bcfzip"];

/// Minimum number of archives for a merge
pub const MIN_MERGE_ARCHIVES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("archive name is empty")]
    EmptyName,

    #[error("archive name '{0}' must not contain path separators")]
    InvalidName(String),

    #[error("'{name}' is not a BCF archive (expected .bcf or .bcfzip)")]
    UnsupportedExtension { name: String },

    #[error("'{0}' is empty")]
    EmptyArchive(String),

    #[error("'{name}' is {size} bytes, limit is {max} bytes")]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("merge needs at least two archives, got {0}")]
    NotEnoughArchives(usize),
}

/// Size limits applied to uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub max_bytes: u64,
}

impl ArchiveLimits {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

/// Validate an archive's name and size before registration
pub fn validate_upload(
    name: &str,
    size: u64,
    limits: ArchiveLimits,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::InvalidName(name.to_string()));
    }
    if !has_accepted_extension(name) {
        return Err(ValidationError::UnsupportedExtension {
            name: name.to_string(),
        });
    }
    if size == 0 {
        return Err(ValidationError::EmptyArchive(name.to_string()));
    }
    if size > limits.max_bytes {
        return Err(ValidationError::TooLarge {
            name: name.to_string(),
            size,
            max: limits.max_bytes,
        });
    }
    Ok(())
}

/// Validate the archive count for a merge request
pub fn validate_merge_count(count: usize) -> Result<(), ValidationError> {
    if count < MIN_MERGE_ARCHIVES {
        return Err(ValidationError::NotEnoughArchives(count));
    }
    Ok(())
}

fn has_accepted_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ACCEPTED_EXTENSIONS
            .iter()
            .any(|accepted| ext.eq_ignore_ascii_case(accepted)),
        _ => false,
    }
}
