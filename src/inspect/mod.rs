//! Inspect module - per-file information gathering.
//!
//! - **Traits**: [`FileHandler`] for type-specific inspection
//! - **Detection**: [`ProbeContext`], built-in [`sniff`] fallback
//! - **Errors**: [`HandlerError`], [`InspectError`]
//! - **Pipeline**: async coordinator via [`pipeline::Inspector`]

pub mod basic;
pub mod handlers;
pub mod pipeline;
pub mod sniff;
pub mod traits;

// Re-export commonly used types
pub use traits::{select_handler, FileHandler, HandlerError, InspectError, ProbeContext};

pub use pipeline::{InspectResult, InspectStats, Inspector, InspectorConfig};
