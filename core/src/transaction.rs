//! The `Transaction` type: public entry point tying the Op Table (C1),
//! Request Intake (C2), Expander (C3) and Executor (C4) together.

use crate::collaborators::{Catalog, Cancellable, DeployStore, NonInteractivePrompt, OciRegistryClient, UserPrompt};
use crate::config::TransactionConfig;
use crate::error::TransactionError;
use crate::executor;
use crate::intake;
use crate::refs::Ref;
use crate::subpaths::Subpaths;
use crate::table::{OpHandle, OpTable};

/// The collaborators a transaction needs beyond its own Op Table, bundled so
/// `intake`/`expand`/`executor` can take one argument instead of four. Every
/// field is a shared reference, so this bundle is itself `Copy` and can be
/// passed around freely without fighting the table's exclusive borrow.
#[derive(Clone, Copy)]
pub(crate) struct External<'a> {
    pub(crate) deploy: &'a dyn DeployStore,
    pub(crate) catalog: &'a dyn Catalog,
    pub(crate) oci: &'a dyn OciRegistryClient,
    pub(crate) prompt: &'a dyn UserPrompt,
    pub(crate) config: &'a TransactionConfig,
}

/// A single planned-and-executed batch of ref installs/updates.
///
/// Not `Send`/`Sync`: it owns an [`OpTable`] of `Rc<RefCell<Op>>` handles and
/// is built, populated and run from one thread.
#[derive(Debug)]
pub struct Transaction<'a> {
    table: OpTable,
    deploy: &'a dyn DeployStore,
    catalog: &'a dyn Catalog,
    oci: &'a dyn OciRegistryClient,
    prompt: &'a dyn UserPrompt,
    config: TransactionConfig,
}

impl<'a> Transaction<'a> {
    /// Start a new, empty transaction against the given collaborators.
    /// Interactive prompts are disabled by default; see [`Self::with_prompt`].
    pub fn new(
        deploy: &'a dyn DeployStore,
        catalog: &'a dyn Catalog,
        oci: &'a dyn OciRegistryClient,
        config: TransactionConfig,
    ) -> Self {
        Self {
            table: OpTable::new(),
            deploy,
            catalog,
            oci,
            prompt: &NonInteractivePrompt,
            config,
        }
    }

    /// Supply an interactive prompt implementation,
    /// used when dependency expansion needs to disambiguate between several
    /// remotes that offer the same runtime.
    pub fn with_prompt(mut self, prompt: &'a dyn UserPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    fn external(&self) -> External<'a> {
        External {
            deploy: self.deploy,
            catalog: self.catalog,
            oci: self.oci,
            prompt: self.prompt,
            config: &self.config,
        }
    }

    /// True if an op for `reference` is already recorded in this transaction.
    pub fn contains_ref(&self, reference: &Ref) -> bool {
        self.table.contains(reference)
    }

    /// Number of distinct refs recorded so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if no ops have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Request an install of `reference` from `remote`.
    ///
    /// `subpaths = None` is normalized to "all subpaths". Fails with
    /// [`TransactionError::AlreadyInstalled`] if the ref is already deployed
    /// in this (or, for a user-scope transaction, the system) scope.
    pub fn add_install(
        &mut self,
        remote: &str,
        reference: Ref,
        subpaths: Option<Subpaths>,
    ) -> Result<OpHandle, TransactionError> {
        let external = self.external();
        intake::add_install(&mut self.table, external, remote, reference, subpaths)
    }

    /// Request an update of `reference`, optionally pinned to `commit`. The
    /// remote is taken from the ref's recorded origin. Fails
    /// with [`TransactionError::NotInstalled`] if the ref is not currently
    /// deployed.
    ///
    /// Returns `Ok(None)` if the resolved origin remote is administratively
    /// disabled: the update is silently skipped and no op is recorded, which
    /// preserves "update everything" batch semantics in the presence of
    /// temporarily disabled remotes.
    pub fn add_update(
        &mut self,
        reference: Ref,
        subpaths: Option<Subpaths>,
        commit: Option<String>,
    ) -> Result<Option<OpHandle>, TransactionError> {
        let external = self.external();
        intake::add_update(&mut self.table, external, reference, subpaths, commit)
    }

    /// Request an install from an OCI image reference: opens
    /// `uri`, selects the image tagged `tag`, derives a ref and an origin
    /// remote from its manifest annotations, and records an install op.
    pub fn add_install_oci(&mut self, uri: &str, tag: &str) -> Result<OpHandle, TransactionError> {
        let external = self.external();
        intake::add_install_oci(&mut self.table, external, uri, tag)
    }

    /// Execute every recorded op in insertion order.
    ///
    /// Returns `Ok(true)` if every op succeeded or was skipped as a noop.
    /// Returns `Err(TransactionError::BatchFailed)` if `stop_on_first_error`
    /// is `false` and at least one fatal op failed anywhere in the batch
    /// (non-fatal ops never contribute to this). If `stop_on_first_error` is
    /// `true`, the first fatal op's own error is returned instead and
    /// execution halts there.
    pub fn run(
        &mut self,
        stop_on_first_error: bool,
        cancellable: &Cancellable,
    ) -> Result<bool, TransactionError> {
        let external = self.external();
        executor::run(&self.table, external, stop_on_first_error, cancellable)
    }
}
