//! The `Op` record and its action kind.

use crate::refs::Ref;
use crate::subpaths::Subpaths;

/// What an `Op` should do. `InstallOrUpdate` is the "resolve at
/// execution" state; the executor collapses it to `Install` or `Update`
/// before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Definitely an install (the ref was not deployed when requested).
    Install,
    /// Definitely an update (the ref was deployed when requested).
    Update,
    /// Either, depending on deploy state at execution time. Produced by
    /// dependency and related-ref expansion, which run ahead of execution
    /// and can't know what the final deploy state will look like.
    InstallOrUpdate,
}

/// A single recorded install/update intent inside a transaction.
#[derive(Debug, Clone)]
pub struct Op {
    /// Source remote name. Always non-empty by the time the op is recorded.
    pub remote: String,
    /// The ref being acted on.
    pub reference: Ref,
    /// Restriction on which subpaths to materialize.
    pub subpaths: Subpaths,
    /// Optional pinned commit.
    pub commit: Option<String>,
    /// What to do with this ref.
    pub kind: OpKind,
    /// If set, failure of this op is logged but does not fail the transaction.
    pub non_fatal: bool,
}

impl Op {
    pub(crate) fn new(
        remote: impl Into<String>,
        reference: Ref,
        subpaths: Subpaths,
        commit: Option<String>,
        kind: OpKind,
    ) -> Self {
        Self {
            remote: remote.into(),
            reference,
            subpaths,
            commit,
            kind,
            non_fatal: false,
        }
    }

    /// Human-readable verb for progress/diagnostic messages.
    pub(crate) fn opname(&self) -> &'static str {
        match self.kind {
            OpKind::Install => "install",
            OpKind::Update => "update",
            OpKind::InstallOrUpdate => "install/update",
        }
    }
}
