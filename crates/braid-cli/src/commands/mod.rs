//! CLI command implementations.
//!
//! - [`build`] - run the pipeline once and commit the output directory
//! - [`serve`] - development server with rebuild-on-change and live reload
//!
//! Each command exposes an `execute` function taking its parsed arguments.

pub mod build;
pub mod serve;

pub use build::execute as build_execute;
pub use serve::execute as serve_execute;
