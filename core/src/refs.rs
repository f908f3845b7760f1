//! Ref and pretty-ref (`pref`) handling.
//!
//! A ref is a slash-delimited identifier whose first segment is its *kind*
//! (`app` or `runtime`); the remainder (the `pref`) identifies name/arch/branch
//! and is what shows up in user-facing progress messages.

use std::fmt;

use crate::error::TransactionError;

/// The kind encoded in a ref's first segment.
///
/// Only `app` and `runtime` are meaningful to the core; anything else is
/// still a valid ref (refs are otherwise opaque strings) but never has
/// runtime dependencies of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `app/...` — may declare a runtime dependency.
    App,
    /// `runtime/...` — never has a declared runtime dependency.
    Runtime,
    /// Anything else. The core never constructs these itself, but a caller
    /// may pass one through `add_install`/`add_update`.
    Other,
}

/// A validated ref: a non-empty string containing at least one `/`.
///
/// A ref with no `/` at all has no well-defined pref, so construction
/// rejects it outright rather than returning an empty or garbled pref later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ref(String);

impl Ref {
    /// Validate and wrap a ref string.
    pub fn new(s: impl Into<String>) -> Result<Self, TransactionError> {
        let s = s.into();
        if !s.contains('/') {
            return Err(TransactionError::InvalidRef(s));
        }
        Ok(Self(s))
    }

    /// Build the `runtime/<value>` ref for a declared runtime dependency.
    pub fn runtime(value: &str) -> Result<Self, TransactionError> {
        Self::new(format!("runtime/{value}"))
    }

    /// The full ref string, e.g. `app/com.example.Foo/x86_64/stable`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The pretty ref: everything after the first `/`, used in messages.
    pub fn pref(&self) -> &str {
        // Safe: construction guarantees at least one '/'.
        self.0.splitn(2, '/').nth(1).unwrap_or_default()
    }

    /// The kind encoded by the first segment.
    pub fn kind(&self) -> RefKind {
        match self.0.split('/').next().unwrap_or_default() {
            "app" => RefKind::App,
            "runtime" => RefKind::Runtime,
            _ => RefKind::Other,
        }
    }

    /// True if this is an `app/...` ref.
    pub fn is_app(&self) -> bool {
        self.kind() == RefKind::App
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ref {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
