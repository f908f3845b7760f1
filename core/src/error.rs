//! Error kinds for the transaction planner/executor.

/// Everything that can go wrong building or running a transaction.
#[derive(thiserror::Error, Debug)]
pub enum TransactionError {
    /// Install requested for a ref already deployed in the target (or, for
    /// a user-scope install, system) scope.
    #[error("{pref} already installed")]
    AlreadyInstalled {
        /// The pretty ref of the offending install request.
        pref: String,
    },

    /// Update requested for a ref that isn't currently deployed.
    #[error("{pref} not installed")]
    NotInstalled {
        /// The pretty ref of the offending update request.
        pref: String,
    },

    /// A ref string had no `/` separator, so no kind/pref could be derived.
    #[error("invalid ref: {0}")]
    InvalidRef(String),

    /// A request was malformed independent of deploy state (e.g. a missing
    /// remote on `add_install`).
    #[error("{0}")]
    InvalidRequest(String),

    /// The OCI manifest's commit annotations were missing the ref.
    #[error("OCI image is not a valid ref image (missing ref annotation): {0}")]
    InvalidOciImage(String),

    /// Dependency expansion found no installed or installable provider for
    /// a declared runtime, or the user aborted the remote-selection prompt.
    /// This is the only error the Expander can use to hard-fail a whole
    /// transaction.
    #[error("the application {app_pref} requires the runtime {runtime_pref} which is not installed")]
    MissingRuntime {
        /// Pretty ref of the app that declared the dependency.
        app_pref: String,
        /// The undecorated runtime value from the app's metadata (no
        /// `runtime/` prefix).
        runtime_pref: String,
    },

    /// A related-ref lookup in the catalog failed. Always recovered:
    /// callers inside this crate log it as a warning and continue; it is
    /// never propagated out of a public entry point. Kept as a distinct
    /// variant so the internal recovery sites stay honest about what they
    /// are catching.
    #[error("problem looking for related refs: {0}")]
    Catalog(String),

    /// The batch executor recorded at least one fatal, non-`stop_on_first_error`
    /// failure; this is the summary error returned at the end of a run.
    #[error("one or more operations failed")]
    BatchFailed,

    /// A deploy-engine (install/update) call failed for a reason the core
    /// doesn't interpret further.
    #[error(transparent)]
    Deploy(#[from] anyhow::Error),
}

impl TransactionError {
    /// True for the deploy-engine's update-noop sentinel. Concrete `DeployStore` implementations should prefer
    /// returning this exact variant so the executor can recognize it.
    pub fn is_already_installed(&self) -> bool {
        matches!(self, TransactionError::AlreadyInstalled { .. })
    }
}
