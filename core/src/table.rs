//! C1 — the Op Table: canonical store of planned operations, keyed by ref.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::op::{Op, OpKind};
use crate::refs::Ref;
use crate::subpaths::Subpaths;

/// A handle to an `Op` inside the table. Cloning shares the same
/// underlying `Op`: callers who add ops that subsequently get merged see
/// the merge reflected through any previously-returned handle — every `Op`
/// in the order sequence is the same object referenced by the table under
/// its ref key.
pub type OpHandle = Rc<RefCell<Op>>;

/// Insertion-ordered, ref-deduplicated store of `Op`s. The transaction's
/// only piece of mutable shared state; it has a single owner (the
/// `Transaction`) and is never exposed outside this crate's public API in
/// mutable form.
#[derive(Debug, Default)]
pub struct OpTable {
    by_ref: HashMap<String, OpHandle>,
    order: Vec<OpHandle>,
}

impl OpTable {
    /// A fresh, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if an Op for this ref is already recorded.
    pub fn contains(&self, reference: &Ref) -> bool {
        self.by_ref.contains_key(reference.as_str())
    }

    /// Ops in the order they were first added.
    pub fn iter(&self) -> impl Iterator<Item = &OpHandle> {
        self.order.iter()
    }

    /// Number of distinct refs recorded.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no ops have been recorded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Create or merge an op for `reference`.
    ///
    /// If no op exists for `reference`, one is created with the given
    /// fields, appended to the insertion-ordered sequence, and returned.
    ///
    /// If one already exists, only `subpaths` is ever touched, via
    /// [`Subpaths::merge_from`] — `install`/`update`, `remote`, and `commit`
    /// are left as the first insertion set them, since the first insertion
    /// represents the user's direct intent and later insertions arise from
    /// expansion.
    pub fn add_op(
        &mut self,
        remote: impl Into<String>,
        reference: Ref,
        subpaths: Subpaths,
        commit: Option<String>,
        kind: OpKind,
    ) -> OpHandle {
        let remote = remote.into();
        tracing::debug!(
            "transaction: {} {}:{}{} {}",
            match kind {
                OpKind::Install => "install",
                OpKind::Update => "update",
                OpKind::InstallOrUpdate => "install/update",
            },
            remote,
            reference,
            commit.as_deref().map(|c| format!("@{c}")).unwrap_or_default(),
            subpaths,
        );

        if let Some(existing) = self.by_ref.get(reference.as_str()) {
            existing.borrow_mut().subpaths.merge_from(&subpaths);
            return existing.clone();
        }

        let op = Rc::new(RefCell::new(Op::new(remote, reference.clone(), subpaths, commit, kind)));
        self.by_ref.insert(reference.as_str().to_owned(), op.clone());
        self.order.push(op.clone());
        op
    }
}
