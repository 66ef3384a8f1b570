//! Stack capture configuration.
//!
//! Capturing and resolving a backtrace on every error construction is the
//! expensive part of building an error. This module lets an application pick
//! a capture policy, either per construction via [`ErrorBase::with_config`]
//! or once for the whole process via [`install`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use abstract_error::config::{self, ConfigError, ConfigLoader, StackConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let stack = StackConfig::load(Path::new("errors.toml"))?;
//!     config::install(stack)?;
//!     Ok(())
//! }
//! ```
//!
//! [`ErrorBase::with_config`]: crate::ErrorBase::with_config

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Error type for configuration operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A process-wide configuration was already installed.
    #[error("Stack configuration already installed")]
    AlreadyInstalled,
}

/// When to capture a stack trace during error construction.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Capture on every construction.
    #[default]
    Always,
    /// Never capture; the stack holds the header line only.
    Never,
    /// Capture when `RUST_LIB_BACKTRACE` (or, if unset, `RUST_BACKTRACE`)
    /// is set to anything but `0`.
    Env,
}

impl CaptureMode {
    /// Resolve the mode against the current environment.
    pub fn enabled(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Env => env_enabled(),
        }
    }
}

fn env_enabled() -> bool {
    std::env::var_os("RUST_LIB_BACKTRACE")
        .or_else(|| std::env::var_os("RUST_BACKTRACE"))
        .is_some_and(|v| v != "0")
}

/// Stack capture policy.
///
/// # TOML Example
///
/// ```toml
/// capture = "env"
/// max_frames = 32
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Capture policy.
    #[serde(default)]
    pub capture: CaptureMode,

    /// Upper bound on caller frames kept in the stack.
    #[serde(default)]
    pub max_frames: Option<usize>,
}

impl StackConfig {
    /// Default policy: always capture, keep every caller frame.
    pub const DEFAULT: Self = Self {
        capture: CaptureMode::Always,
        max_frames: None,
    };

    /// Policy that never captures.
    pub const DISABLED: Self = Self {
        capture: CaptureMode::Never,
        max_frames: None,
    };

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `max_frames` is zero.
    /// Use `capture = "never"` to drop frames entirely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frames == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_frames must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

static INSTALLED: OnceLock<StackConfig> = OnceLock::new();

/// Install the process-wide stack configuration.
///
/// # Errors
///
/// - `ConfigError::ValidationError` if `config` is invalid
/// - `ConfigError::AlreadyInstalled` on every call after the first success
pub fn install(config: StackConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let (capture, max_frames) = (config.capture, config.max_frames);
    INSTALLED
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)?;
    tracing::debug!(?capture, ?max_frames, "stack configuration installed");
    Ok(())
}

/// Installed configuration, or [`StackConfig::DEFAULT`].
pub fn current() -> &'static StackConfig {
    INSTALLED.get().unwrap_or(&StackConfig::DEFAULT)
}
