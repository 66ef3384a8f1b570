//! Prelude module for common re-exports.
//!
//! ```rust
//! use abstract_error::prelude::*;
//! ```

pub use crate::abstract_error;
pub use crate::base::ErrorBase;
pub use crate::config::{CaptureMode, ConfigError, ConfigLoader, StackConfig};
pub use crate::lineage::{AbstractError, Upcast};
pub use crate::name::TypeTag;
pub use crate::stack::StackFrame;
