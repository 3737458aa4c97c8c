//! `pairlink` Core Library
//!
//! Shared functionality for `pairlink` components:
//! - Configuration resolution (defaults, JSON file, environment)
//! - Tracing subscriber setup
//! - Common error types

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
