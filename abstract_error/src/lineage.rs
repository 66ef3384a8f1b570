//! The abstract error trait and identity checks along the subtype chain.
//!
//! Rust has no struct inheritance, so an error "subclass" embeds its
//! supertype as a field:
//!
//! ```text
//! NotFound { http: HttpError { base: ErrorBase, status }, path }
//!    │            │                 │
//!    │            │                 └─ shared state: name, message, stack
//!    │            └─ intermediate subtype, `parent()` of NotFound
//!    └─ most-derived type
//! ```
//!
//! Identity checks walk this chain with `Any` downcasts, so a `NotFound`
//! is an instance of `NotFound`, of `HttpError`, of `dyn AbstractError` and
//! of `dyn std::error::Error`.

use std::any::{type_name, Any};
use std::error::Error;

use crate::base::ErrorBase;
use crate::stack::StackFrame;

/// Upcasts available on every error type.
///
/// Blanket-implemented, so calls through `dyn AbstractError` dispatch to the
/// concrete type and yield its `Any`/`Error` view.
pub trait Upcast: Any {
    /// View as `dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// View as the native error trait object.
    fn as_error(&self) -> &(dyn Error + Send + Sync + 'static);

    /// Convert into a boxed native error.
    fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static>;

    /// Fully qualified name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Error + Send + Sync + 'static> Upcast for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Base contract shared by every custom error type.
///
/// Implementors embed an [`ErrorBase`] (directly, or through an intermediate
/// error type) and expose it via [`base`](Self::base). The
/// [`abstract_error!`](crate::abstract_error) macro generates this impl
/// together with `Display` and `Error`.
///
/// # Example
///
/// ```
/// use abstract_error::{abstract_error, AbstractError, ErrorBase};
///
/// #[derive(Debug)]
/// pub struct QuotaExceeded {
///     base: ErrorBase,
///     pub limit: u32,
/// }
///
/// impl QuotaExceeded {
///     pub fn new(limit: u32) -> Self {
///         Self {
///             base: ErrorBase::new::<Self>(format!("limit {limit} reached")),
///             limit,
///         }
///     }
/// }
///
/// abstract_error!(QuotaExceeded { base });
///
/// let err = QuotaExceeded::new(3);
/// assert_eq!(err.name(), "QuotaExceeded");
/// assert_eq!(err.to_string(), "QuotaExceeded: limit 3 reached");
/// ```
pub trait AbstractError: Error + Upcast + Send + Sync + 'static {
    /// Shared base state.
    fn base(&self) -> &ErrorBase;

    /// Mutable access to the shared base state.
    fn base_mut(&mut self) -> &mut ErrorBase;

    /// Embedded supertype, for types that extend another error type.
    fn parent(&self) -> Option<&dyn AbstractError> {
        None
    }

    /// Name of the most-derived type.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Human-readable message, empty when none was given.
    fn message(&self) -> &str {
        self.base().message()
    }

    /// Header line followed by the caller frames.
    fn stack(&self) -> &str {
        self.base().stack()
    }

    /// Caller frames, innermost first.
    fn frames(&self) -> &[StackFrame] {
        self.base().frames()
    }

    /// Re-stamp an already-built error as the outer type `T` embedding it.
    ///
    /// See [`ErrorBase::retag`].
    fn retag<T: AbstractError>(mut self) -> Self
    where
        Self: Sized,
    {
        self.base_mut().restamp::<T>();
        self
    }
}

impl dyn AbstractError {
    /// Returns true if this error is a `T` at any level of its chain.
    pub fn is<T: AbstractError>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// The `T` level of this error's chain, if there is one.
    pub fn downcast_ref<T: AbstractError>(&self) -> Option<&T> {
        let mut level: Option<&dyn AbstractError> = Some(self);
        while let Some(err) = level {
            if let Some(found) = err.as_any().downcast_ref::<T>() {
                return Some(found);
            }
            level = err.parent();
        }
        None
    }

    /// Short type names of the chain, most-derived first.
    pub fn lineage(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut level: Option<&dyn AbstractError> = Some(self);
        while let Some(err) = level {
            names.push(crate::name::short_type_name(err.type_name()));
            level = err.parent();
        }
        names
    }
}
