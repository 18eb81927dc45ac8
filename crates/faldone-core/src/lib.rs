//! Faldone Core — error type and configuration.

pub mod config;
pub mod error;

pub use config::FaldoneConfig;
pub use error::{Error, Result};
