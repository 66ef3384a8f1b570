//! Abstract Error Base
//!
//! Base contract for custom error types. Every type built on it:
//!
//! - reports its own concrete type name (no per-type name strings),
//! - passes identity checks against `dyn std::error::Error`,
//!   `dyn AbstractError`, every intermediate error type it extends and itself,
//! - carries a stack trace whose first line is `Name: message` and whose
//!   frames start at the code that constructed the error, not inside the
//!   construction machinery.
//!
//! # Module Structure
//!
//! - [`base`] - `ErrorBase` state and construction
//! - [`lineage`] - `AbstractError` trait and identity checks
//! - [`name`] - runtime type tags and type naming
//! - [`stack`] - stack capture and frame trimming
//! - [`config`] - capture policy, TOML loading
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use abstract_error::prelude::*;
//!
//! #[derive(Debug)]
//! pub struct CustomError {
//!     base: ErrorBase,
//!     pub value: String,
//! }
//!
//! impl CustomError {
//!     pub fn new(message: &str) -> Self {
//!         Self { base: ErrorBase::new::<Self>(message), value: "foo".into() }
//!     }
//! }
//!
//! abstract_error!(CustomError { base });
//!
//! fn fails() -> Result<(), Box<dyn std::error::Error>> {
//!     Err(CustomError::new("error message"))?
//! }
//!
//! let err = fails().unwrap_err();
//! assert!(err.is::<CustomError>());
//! assert_eq!(err.to_string(), "CustomError: error message");
//! ```

pub mod base;
pub mod config;
pub mod lineage;
mod macros;
pub mod name;
pub mod prelude;
pub mod stack;

pub use base::ErrorBase;
pub use lineage::{AbstractError, Upcast};
pub use stack::StackFrame;
