//! # BCF Hub Common Library
//!
//! Shared code for the BCF Hub components including:
//! - Issue model and the inspection service wire format
//! - Event types (HubEvent enum) and the EventBus
//! - Bootstrap configuration loading
//! - SSE helpers

pub mod bcf;
pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use bcf::{Comment, Issue};
pub use error::{Error, Result};
