#![doc = include_str!("../README.md")]

pub mod cli;
pub mod executor;
pub mod inspect;
pub mod model;
pub mod package;
pub mod render;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export common types for convenience
pub use executor::*;
pub use model::*;
pub use traits::*;
