//! # cookbot-core
//!
//! Core types for the cookbot daily-plan pipeline.
//!
//! Everything here is plain data and configuration: the error type, the
//! cuisine catalog, recipe values exchanged between agent roles, and the
//! fail-open helpers used at infrastructure boundaries.

mod catalog;
mod config;
mod error;
pub mod fail_open;
mod types;

pub use catalog::{CuisineCatalog, Region};
pub use config::{
    CookbotConfig, GatewayConfig, MemoryLimits, ModelConfig, SearchConfig, WorkshopConfig,
    CONFIG_FILE_NAME,
};
pub use error::{CookbotError, Result};
pub use types::*;
