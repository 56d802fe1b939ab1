//! Unified error types for cookbot

use thiserror::Error;

/// Unified error type for all cookbot operations
///
/// Model-side failures never surface here: the gateway degrades them to a
/// neutral result. These variants cover conditions a caller must see.
#[derive(Error, Debug)]
pub enum CookbotError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No model credentials configured (set {0} or {0}_2 .. {0}_10)")]
    NoCredentials(String),

    // Persistence errors
    #[error("Memory store error: {0}")]
    Memory(String),

    #[error("Daily plan error: {0}")]
    DailyPlan(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using CookbotError
pub type Result<T> = std::result::Result<T, CookbotError>;
