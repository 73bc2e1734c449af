//! Configuration for discovery, scanning and loading

pub mod file_config;
pub mod reference_names;

pub use file_config::*;
pub use reference_names::*;
