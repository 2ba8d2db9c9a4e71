//! Common utilities and definitions shared across modules
//!
//! Configuration and the crate-wide error type live here.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
