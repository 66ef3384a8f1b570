//! Stack capture and construction-frame trimming.
//!
//! A trace is captured as structured frames, one [`StackFrame`] per resolved
//! symbol (inlined calls included), innermost first. Trimming happens in two
//! passes:
//!
//! 1. the leading frames of the capture machinery itself (`backtrace`, this
//!    module and `ErrorBase`) are always dropped;
//! 2. the first remaining frame of the most-derived type is the constructor;
//!    it and every frame above it are dropped. Without such a frame (an error
//!    built from a struct literal in a free function) nothing more is cut.
//!
//! ```text
//!  0  backtrace::backtrace::trace            ┐ machinery
//!  1  abstract_error::stack::capture          │
//!  2  abstract_error::base::ErrorBase::new   ┘
//!  3  app::HttpError::derived                ┐ constructor
//!  4  app::NotFound::new                     ┘  <- first frame of `NotFound`
//!  5  app::handlers::lookup                     <- kept
//!  6  ...
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use backtrace::{Backtrace, BacktraceSymbol};

use crate::config::StackConfig;
use crate::name::TypeTag;

/// Placeholder function name for frames without symbol information.
pub const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Path prefixes of the functions that perform the capture.
const MACHINERY: [&str; 3] = [
    "backtrace::",
    concat!(env!("CARGO_CRATE_NAME"), "::stack::"),
    concat!(env!("CARGO_CRATE_NAME"), "::base::"),
];

/// One resolved call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    function: String,
    file: Option<PathBuf>,
    line: Option<u32>,
    column: Option<u32>,
}

impl StackFrame {
    /// Create a frame from its parts.
    pub fn new(
        function: impl Into<String>,
        file: Option<PathBuf>,
        line: Option<u32>,
        column: Option<u32>,
    ) -> Self {
        Self {
            function: function.into(),
            file,
            line,
            column,
        }
    }

    fn from_symbol(symbol: &BacktraceSymbol) -> Self {
        let function = symbol
            .name()
            .map(|name| format!("{:#}", name))
            .unwrap_or_else(|| UNKNOWN_FUNCTION.to_string());
        Self {
            function,
            file: symbol.filename().map(Path::to_path_buf),
            line: symbol.lineno(),
            column: symbol.colno(),
        }
    }

    /// Demangled function path, without the symbol hash.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Source file, when debug info is available.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// 1-based source line.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// 1-based source column.
    pub fn column(&self) -> Option<u32> {
        self.column
    }

    /// Returns true if this frame runs code of the tagged type: an inherent
    /// associated function (`path::Type::f`, `Type<T>::f`) or a trait method
    /// implemented for it (`<path::Type as Trait>::f`).
    ///
    /// A module path written in front of the type name must agree with the
    /// tag's path, so same-named types in other modules do not match.
    /// Occurrences inside generic arguments (`f::<path::Type>`) do not count.
    pub fn belongs_to(&self, tag: &TypeTag) -> bool {
        names_type(&self.function, tag.qualified())
    }

    /// Returns true if this frame is part of the stack capture itself.
    pub fn is_machinery(&self) -> bool {
        let function = self.function.trim_start_matches('<');
        MACHINERY.iter().any(|prefix| function.starts_with(prefix))
    }
}

fn names_type(function: &str, qualified: &str) -> bool {
    let ident = qualified.rsplit("::").next().unwrap_or(qualified);
    if ident.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(offset) = function[from..].find(ident) {
        let start = from + offset;
        let end = start + ident.len();
        let before = &function[..start];
        let after = &function[end..];

        let opens = before.is_empty() || before.ends_with("::") || before.ends_with('<');
        let closes =
            after.starts_with("::") || after.starts_with(" as ") || after.starts_with('<');
        if opens && closes && qualifier_agrees(before, ident, qualified) {
            return true;
        }
        from = end;
    }
    false
}

/// Compare the path written before `ident` in a symbol with the tag's path.
fn qualifier_agrees(before: &str, ident: &str, qualified: &str) -> bool {
    let Some(prefix) = before.strip_suffix("::") else {
        return true;
    };
    let start = prefix
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let written = format!("{}::{}", &prefix[start..], ident);
    qualified == written || qualified.ends_with(&format!("::{}", written))
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}", self.function)?;
        if let Some(file) = &self.file {
            write!(f, " ({}", file.display())?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
                if let Some(column) = self.column {
                    write!(f, ":{}", column)?;
                }
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Frames that survived trimming.
#[derive(Debug, Clone)]
pub(crate) struct Trimmed {
    pub frames: Vec<StackFrame>,
    /// False when no constructor frame was found.
    pub matched: bool,
}

/// Capture the current thread's stack as structured frames.
#[inline(never)]
pub(crate) fn capture() -> Vec<StackFrame> {
    let trace = Backtrace::new();
    let mut frames = Vec::with_capacity(trace.frames().len());
    for frame in trace.frames() {
        let symbols = frame.symbols();
        if symbols.is_empty() {
            frames.push(StackFrame::new(UNKNOWN_FUNCTION, None, None, None));
            continue;
        }
        frames.extend(symbols.iter().map(StackFrame::from_symbol));
    }
    frames
}

/// Drop the capture machinery, then everything up to and including the
/// first frame of the tagged type.
pub(crate) fn trim_to_caller(mut frames: Vec<StackFrame>, tag: &TypeTag) -> Trimmed {
    let machinery = frames.iter().take_while(|f| f.is_machinery()).count();
    frames.drain(..machinery);

    match frames.iter().position(|f| f.belongs_to(tag)) {
        Some(constructor) => {
            frames.drain(..=constructor);
            Trimmed {
                frames,
                matched: true,
            }
        }
        None => Trimmed {
            frames,
            matched: false,
        },
    }
}

/// Drop the innermost kept frame if it belongs to the tagged type.
///
/// Used when an already-built error is re-stamped as an outer type: its
/// frames start at whatever built it, which is the outer constructor.
pub(crate) fn drop_constructor_frame(frames: &mut Vec<StackFrame>, tag: &TypeTag) -> bool {
    if frames.first().is_some_and(|f| f.belongs_to(tag)) {
        frames.remove(0);
        return true;
    }
    false
}

/// Capture, trim and cap the caller frames for a construction of `tag`.
pub(crate) fn caller_frames(tag: &TypeTag, config: &StackConfig) -> Vec<StackFrame> {
    if !config.capture.enabled() {
        return Vec::new();
    }
    let mut trimmed = trim_to_caller(capture(), tag);
    if !trimmed.matched {
        tracing::debug!(
            error = tag.ident(),
            frames = trimmed.frames.len(),
            "constructor frame not found, keeping caller trace untrimmed"
        );
    }
    if let Some(max) = config.max_frames {
        trimmed.frames.truncate(max);
    }
    trimmed.frames
}

/// Join the header line and the frames into the final stack text.
pub(crate) fn render(header: &str, frames: &[StackFrame]) -> String {
    let mut out = String::from(header);
    for frame in frames {
        out.push_str("\n    ");
        out.push_str(&frame.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NotFound;

    fn frame(function: &str) -> StackFrame {
        StackFrame::new(function, None, None, None)
    }

    fn own(function: &str) -> String {
        format!("{}::{}", env!("CARGO_CRATE_NAME"), function)
    }

    #[test]
    fn test_names_type_inherent_method() {
        assert!(names_type("app::errors::NotFound::new", "app::errors::NotFound"));
        assert!(names_type("NotFound::new", "app::errors::NotFound"));
        assert!(names_type("errors::NotFound::new", "app::errors::NotFound"));
        assert!(names_type("app::Wrapper<T>::new", "app::Wrapper"));
    }

    #[test]
    fn test_names_type_trait_impl() {
        assert!(names_type(
            "<app::NotFound as core::convert::From<u16>>::from",
            "app::NotFound"
        ));
        assert!(names_type(
            "<NotFound as core::default::Default>::default",
            "app::NotFound"
        ));
    }

    #[test]
    fn test_names_type_rejects_generic_argument() {
        assert!(!names_type(
            "abstract_error::base::ErrorBase::new::<app::NotFound>",
            "app::NotFound"
        ));
    }

    #[test]
    fn test_names_type_rejects_partial_ident() {
        assert!(!names_type("app::NotFoundHandler::run", "app::NotFound"));
        assert!(!names_type("app::MyNotFound::new", "app::NotFound"));
        assert!(!names_type("app::lookup", ""));
    }

    #[test]
    fn test_names_type_rejects_other_module() {
        assert!(!names_type("app::db::Error::new", "app::http::Error"));
        assert!(!names_type("<app::db::Error as core::fmt::Display>::fmt", "app::http::Error"));
        assert!(names_type("app::http::Error::new", "app::http::Error"));
    }

    #[test]
    fn test_belongs_to_uses_tag_path() {
        let tag = TypeTag::of::<NotFound>();
        assert!(frame(&format!("{}::new", tag.path())).belongs_to(&tag));
        assert!(!frame("other::NotFound::new").belongs_to(&tag));
    }

    #[test]
    fn test_machinery_detection() {
        assert!(frame("backtrace::backtrace::libunwind::trace").is_machinery());
        assert!(frame(&own("stack::capture")).is_machinery());
        assert!(frame(&own("base::ErrorBase::new")).is_machinery());
        assert!(!frame("std::sys::backtrace::__rust_begin_short_backtrace").is_machinery());
        assert!(!frame(&own("lineage::tests::outer")).is_machinery());
    }

    #[test]
    fn test_trim_cuts_single_constructor_frame() {
        let tag = TypeTag::of::<NotFound>();
        let frames = vec![
            frame("backtrace::backtrace::trace"),
            frame(&own("stack::capture")),
            frame(&own("base::ErrorBase::new")),
            frame(&format!("{}::new", tag.path())),
            frame(&format!("{}::check", tag.path())),
            frame("app::handlers::lookup"),
        ];
        let trimmed = trim_to_caller(frames, &tag);
        assert!(trimmed.matched);
        let names: Vec<_> = trimmed.frames.iter().map(StackFrame::function).collect();
        assert_eq!(
            names,
            vec![format!("{}::check", tag.path()).as_str(), "app::handlers::lookup"]
        );
    }

    #[test]
    fn test_trim_without_constructor_still_drops_machinery() {
        let tag = TypeTag::of::<NotFound>();
        let frames = vec![
            frame("backtrace::capture::Backtrace::new"),
            frame(&own("stack::caller_frames")),
            frame(&own("base::ErrorBase::construct")),
            frame("app::build_literal"),
            frame("app::main"),
        ];
        let trimmed = trim_to_caller(frames, &tag);
        assert!(!trimmed.matched);
        assert_eq!(trimmed.frames, vec![frame("app::build_literal"), frame("app::main")]);
    }

    #[test]
    fn test_drop_constructor_frame_only_at_top() {
        let tag = TypeTag::of::<NotFound>();
        let ctor = frame(&format!("{}::new", tag.path()));

        let mut frames = vec![ctor.clone(), frame("app::main")];
        assert!(drop_constructor_frame(&mut frames, &tag));
        assert_eq!(frames, vec![frame("app::main")]);

        let mut frames = vec![frame("app::main"), ctor];
        assert!(!drop_constructor_frame(&mut frames, &tag));
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_caller_frames_disabled() {
        let tag = TypeTag::of::<NotFound>();
        assert!(caller_frames(&tag, &StackConfig::DISABLED).is_empty());
    }

    #[test]
    fn test_frame_display() {
        let src = || Some(PathBuf::from("src/main.rs"));
        let full = StackFrame::new("app::main", src(), Some(12), Some(5));
        assert_eq!(full.to_string(), "at app::main (src/main.rs:12:5)");

        let no_column = StackFrame::new("app::main", src(), Some(12), None);
        assert_eq!(no_column.to_string(), "at app::main (src/main.rs:12)");

        assert_eq!(frame("app::main").to_string(), "at app::main");
    }

    #[test]
    fn test_render() {
        assert_eq!(render("Oops", &[]), "Oops");
        assert_eq!(
            render("Oops: bad", &[frame("a::b"), frame("a::c")]),
            "Oops: bad\n    at a::b\n    at a::c"
        );
    }
}
