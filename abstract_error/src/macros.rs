//! Boilerplate generator for error types.

/// Implement `Display`, `std::error::Error` and [`AbstractError`] for an
/// error type.
///
/// Two forms:
///
/// - `abstract_error!(Type { field })`: `field` is the type's [`ErrorBase`].
/// - `abstract_error!(Type: Parent { field })`: `field` holds the embedded
///   `Parent` error, which becomes the next level of the identity chain.
///
/// The type must implement `Debug` itself.
///
/// ```
/// use abstract_error::{abstract_error, AbstractError, ErrorBase};
///
/// #[derive(Debug)]
/// pub struct StorageError {
///     base: ErrorBase,
/// }
///
/// #[derive(Debug)]
/// pub struct DiskFull {
///     storage: StorageError,
///     pub device: String,
/// }
///
/// impl DiskFull {
///     pub fn new(device: &str) -> Self {
///         Self {
///             storage: StorageError { base: ErrorBase::new::<Self>("no space left") },
///             device: device.to_string(),
///         }
///     }
/// }
///
/// abstract_error!(StorageError { base });
/// abstract_error!(DiskFull: StorageError { storage });
///
/// let err: &dyn AbstractError = &DiskFull::new("sda1");
/// assert!(err.is::<StorageError>());
/// assert_eq!(err.to_string(), "DiskFull: no space left");
/// ```
///
/// [`AbstractError`]: crate::AbstractError
/// [`ErrorBase`]: crate::ErrorBase
#[macro_export]
macro_rules! abstract_error {
    ($ty:ident { $field:ident }) => {
        $crate::abstract_error!(@display $ty);

        impl $crate::AbstractError for $ty {
            fn base(&self) -> &$crate::ErrorBase {
                &self.$field
            }

            fn base_mut(&mut self) -> &mut $crate::ErrorBase {
                &mut self.$field
            }
        }
    };

    ($ty:ident : $parent:ty { $field:ident }) => {
        $crate::abstract_error!(@display $ty);

        impl $crate::AbstractError for $ty {
            fn base(&self) -> &$crate::ErrorBase {
                <$parent as $crate::AbstractError>::base(&self.$field)
            }

            fn base_mut(&mut self) -> &mut $crate::ErrorBase {
                <$parent as $crate::AbstractError>::base_mut(&mut self.$field)
            }

            fn parent(&self) -> ::core::option::Option<&dyn $crate::AbstractError> {
                ::core::option::Option::Some(&self.$field)
            }
        }
    };

    (@display $ty:ident) => {
        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt($crate::AbstractError::base(self), f)
            }
        }

        impl ::std::error::Error for $ty {}
    };
}
