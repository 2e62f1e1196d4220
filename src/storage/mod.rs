//! Storage Layer
//!
//! Settings persistence (JSON config file).

pub mod config;

pub use config::*;
