//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions and environment overrides
//! - [`defaults`]: Serde default functions and the placeholder admin credentials
//! - [`validation`]: Startup validation that reports every problem at once

mod defaults;
mod types;
mod validation;

pub use defaults::is_default_credential;
pub use types::{Config, DocsConfig, LogFormat};
pub use validation::validate;
