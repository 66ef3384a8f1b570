//! Shared state of every error instance and its construction sequence.

use std::fmt;

use static_assertions::assert_impl_all;

use crate::config::{self, StackConfig};
use crate::lineage::AbstractError;
use crate::name::TypeTag;
use crate::stack::{self, StackFrame};

/// Name, message and stack of an error instance.
///
/// Every constructor is generic over the most-derived error type `T`, so a
/// base only ever exists on behalf of a concrete [`AbstractError`]
/// implementor.
///
/// An outer type that embeds an already-built intermediate error re-stamps
/// it with [`AbstractError::retag`], which moves the name, the header and the
/// stack over to the outer type:
///
/// ```
/// use abstract_error::{abstract_error, AbstractError, ErrorBase};
///
/// #[derive(Debug)]
/// pub struct HttpError {
///     base: ErrorBase,
///     pub status: u16,
/// }
///
/// impl HttpError {
///     pub fn new(status: u16, message: &str) -> Self {
///         Self { base: ErrorBase::new::<Self>(message), status }
///     }
/// }
///
/// #[derive(Debug)]
/// pub struct NotFound {
///     http: HttpError,
/// }
///
/// impl NotFound {
///     pub fn new(path: &str) -> Self {
///         Self { http: HttpError::new(404, path).retag::<Self>() }
///     }
/// }
///
/// abstract_error!(HttpError { base });
/// abstract_error!(NotFound: HttpError { http });
///
/// let err = NotFound::new("/missing");
/// assert_eq!(err.name(), "NotFound");
/// assert_eq!(err.stack().lines().next(), Some("NotFound: /missing"));
/// assert_eq!(err.http.status, 404);
/// ```
///
/// Intermediate types may instead take the outer type as a parameter and
/// build the base for it directly (`ErrorBase::new::<T>(..)`).
#[derive(Clone)]
pub struct ErrorBase {
    tag: TypeTag,
    name: String,
    message: String,
    stack: String,
    frames: Vec<StackFrame>,
}

assert_impl_all!(ErrorBase: Send, Sync, Clone);

impl ErrorBase {
    /// Build the base of a `T` carrying `message`.
    #[inline(never)]
    pub fn new<T: AbstractError>(message: impl Into<String>) -> Self {
        Self::construct::<T>(message.into(), config::current())
    }

    /// Build the base of a `T` with an empty message.
    #[inline(never)]
    pub fn without_message<T: AbstractError>() -> Self {
        Self::construct::<T>(String::new(), config::current())
    }

    /// Build the base of a `T` under an explicit capture policy instead of
    /// the installed one.
    #[inline(never)]
    pub fn with_config<T: AbstractError>(
        message: impl Into<String>,
        config: &StackConfig,
    ) -> Self {
        Self::construct::<T>(message.into(), config)
    }

    #[inline(never)]
    fn construct<T: AbstractError>(message: String, config: &StackConfig) -> Self {
        let tag = TypeTag::of::<T>();
        let name = tag.short_name();
        let frames = stack::caller_frames(&tag, config);
        let stack = stack::render(&header(&name, &message), &frames);

        tracing::trace!(error = %name, frames = frames.len(), "error constructed");

        Self {
            tag,
            name,
            message,
            stack,
            frames,
        }
    }

    /// Re-stamp this base as belonging to `T`.
    ///
    /// Recomputes the tag, the name and the stack header, and drops `T`'s
    /// constructor frame when it is the innermost kept frame. A base already
    /// tagged `T` is returned unchanged.
    pub fn retag<T: AbstractError>(mut self) -> Self {
        self.restamp::<T>();
        self
    }

    pub(crate) fn restamp<T: AbstractError>(&mut self) {
        let tag = TypeTag::of::<T>();
        if tag == self.tag {
            return;
        }
        let previous = std::mem::replace(&mut self.tag, tag);
        self.name = tag.short_name();
        stack::drop_constructor_frame(&mut self.frames, &tag);
        self.stack = stack::render(&header(&self.name, &self.message), &self.frames);

        tracing::trace!(from = %previous, error = %self.name, "error re-stamped");
    }

    /// Name of the most-derived type.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message, empty when none was given.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Header line followed by one `at ...` line per caller frame.
    #[inline]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Caller frames, innermost first.
    #[inline]
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Runtime type tag of the most-derived type.
    #[inline]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }
}

fn header(name: &str, message: &str) -> String {
    if message.is_empty() {
        name.to_string()
    } else {
        format!("{}: {}", name, message)
    }
}

/// `Name: message`, or `Name` alone for an empty message.
/// The alternate form (`{:#}`) renders the whole stack.
impl fmt::Display for ErrorBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.stack);
        }
        f.write_str(&self.name)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ErrorBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBase")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("frames", &self.frames.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstract_error;

    #[derive(Debug)]
    struct Sample {
        base: ErrorBase,
    }

    #[derive(Debug)]
    struct Outer {
        inner: Sample,
    }

    abstract_error!(Sample { base });
    abstract_error!(Outer: Sample { inner });

    impl Sample {
        fn quiet(message: &str) -> Self {
            Self {
                base: ErrorBase::with_config::<Self>(message, &StackConfig::DISABLED),
            }
        }
    }

    #[test]
    fn test_header_forms() {
        assert_eq!(header("Sample", "bad"), "Sample: bad");
        assert_eq!(header("Sample", ""), "Sample");
    }

    #[test]
    fn test_disabled_capture_leaves_header_only() {
        let err = Sample::quiet("bad input");
        assert_eq!(err.base.stack(), "Sample: bad input");
        assert!(err.base.frames().is_empty());
    }

    #[test]
    fn test_tag_names_most_derived() {
        let err = Sample::quiet("x");
        assert!(err.base.tag().is::<Sample>());
        assert_eq!(err.base.name(), "Sample");
    }

    #[test]
    fn test_display_alternate_renders_stack() {
        let err = Sample::quiet("");
        assert_eq!(format!("{}", err.base), "Sample");
        assert_eq!(format!("{:#}", err.base), err.base.stack());
    }

    #[test]
    fn test_debug_is_compact() {
        let err = Sample::quiet("x");
        let debug = format!("{:?}", err.base);
        assert!(debug.starts_with("ErrorBase { name: \"Sample\", message: \"x\""));
    }

    #[test]
    fn test_retag_moves_identity_to_outer() {
        let base = Sample::quiet("bad input").base.retag::<Outer>();
        assert!(base.tag().is::<Outer>());
        assert_eq!(base.name(), "Outer");
        assert_eq!(base.message(), "bad input");
        assert_eq!(base.stack(), "Outer: bad input");
        assert_eq!(base.to_string(), "Outer: bad input");
    }

    #[test]
    fn test_retag_drops_outer_constructor_frame() {
        let outer_ctor = StackFrame::new(
            format!("{}::new", TypeTag::of::<Outer>().path()),
            None,
            None,
            None,
        );
        let caller = StackFrame::new("app::handler", None, None, None);
        let mut base = Sample::quiet("x").base;
        base.frames = vec![outer_ctor, caller.clone()];

        let base = base.retag::<Outer>();
        assert_eq!(base.frames(), &[caller]);
        assert_eq!(base.stack(), "Outer: x\n    at app::handler");
    }

    #[test]
    fn test_retag_same_type_is_unchanged() {
        let caller = StackFrame::new("app::handler", None, None, None);
        let mut base = Sample::quiet("x").base;
        base.frames = vec![caller.clone()];

        let base = base.retag::<Sample>();
        assert_eq!(base.frames(), &[caller]);
        assert_eq!(base.name(), "Sample");
    }
}
