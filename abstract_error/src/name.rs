//! Runtime type tags and concrete type naming.
//!
//! Names are derived from `std::any::type_name` with every module path
//! stripped, so `my_app::errors::NotFound` reports as `NotFound` and
//! `Wrapper<alloc::string::String>` as `Wrapper<String>`.

use std::any::{type_name, TypeId};
use std::fmt;

/// Runtime type tag of the most-derived error type.
///
/// Captured once, at base construction, from the type parameter the
/// outermost constructor threads down through every intermediate level.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    id: TypeId,
    path: &'static str,
}

impl TypeTag {
    /// Tag of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: type_name::<T>(),
        }
    }

    /// `TypeId` of the tagged type.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type path as reported by the compiler.
    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Type name with module paths stripped (generic arguments kept).
    pub fn short_name(&self) -> String {
        short_type_name(self.path)
    }

    /// Type path without generic arguments, as it appears in symbol names.
    pub fn qualified(&self) -> &'static str {
        self.path.split('<').next().unwrap_or(self.path)
    }

    /// Bare identifier of the type: short name without generic arguments.
    pub fn ident(&self) -> &'static str {
        last_segment(self.qualified())
    }

    /// Returns true if this tag denotes `T`.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeTag").field(&self.path).finish()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from every path segment of a type name.
///
/// ```
/// use abstract_error::name::short_type_name;
///
/// assert_eq!(short_type_name("app::errors::NotFound"), "NotFound");
/// assert_eq!(
///     short_type_name("app::Wrapper<alloc::string::String>"),
///     "Wrapper<String>"
/// );
/// ```
pub fn short_type_name(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut token = String::new();

    for ch in path.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            token.push(ch);
        } else {
            out.push_str(last_segment(&token));
            token.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&token));
    out
}

#[inline]
fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
