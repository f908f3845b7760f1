//! External interfaces. The core consumes these as plain trait
//! objects; the `reftx` CLI crate supplies concrete implementations backed
//! by a local state file, a directory-of-remotes catalog, a real OCI
//! registry client, and a terminal prompt.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TransactionError;
use crate::refs::Ref;
use crate::subpaths::Subpaths;

/// A cooperative, pass-through cancellation token. The executor
/// never inspects it itself; it is threaded through to every
/// `DeployStore::install`/`update` call so the deploy engine can check it at
/// its own checkpoints.
#[derive(Debug, Clone, Default)]
pub struct Cancellable(Arc<AtomicBool>);

impl Cancellable {
    /// A token that is never cancelled unless [`Self::cancel`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True if [`Self::cancel`] has been called on this token (or a clone
    /// sharing its state).
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The local/system deploy state.
pub trait DeployStore: fmt::Debug {
    /// Is `reference` currently deployed in this store's scope?
    fn is_deployed(&self, reference: &Ref) -> bool;

    /// The remote recorded as `reference`'s origin, if deployed.
    fn get_origin(&self, reference: &Ref) -> Option<String>;

    /// The full commit hash currently deployed for `reference`, if any.
    fn get_commit(&self, reference: &Ref) -> Option<String>;

    /// Is `remote` administratively disabled?
    fn is_remote_disabled(&self, remote: &str) -> bool;

    /// Install `reference` from `remote`.
    ///
    /// Implementations should return [`TransactionError::AlreadyInstalled`]
    /// if the ref turns out to already be present (the executor does not
    /// rely on this for install, only for the update-noop case below, but
    /// it is good practice for any entry point that can race).
    #[allow(clippy::too_many_arguments)]
    fn install(
        &self,
        reference: &Ref,
        remote: &str,
        subpaths: &Subpaths,
        no_pull: bool,
        no_deploy: bool,
        cancellable: &Cancellable,
    ) -> Result<(), TransactionError>;

    /// Update `reference`, optionally pinned to `commit`.
    ///
    /// Must return [`TransactionError::AlreadyInstalled`] when there is
    /// nothing to do (the requested commit, or latest, is already
    /// deployed) — the executor specifically recognizes this variant to
    /// implement the "No updates." noop path.
    #[allow(clippy::too_many_arguments)]
    fn update(
        &self,
        reference: &Ref,
        remote: &str,
        commit: Option<&str>,
        subpaths: &Subpaths,
        no_pull: bool,
        no_deploy: bool,
        cancellable: &Cancellable,
    ) -> Result<(), TransactionError>;

    /// Is this store a user-scope (as opposed to system-scope) store?
    fn is_user_scope(&self) -> bool;

    /// For a user-scope store, a handle to the system-scope store sharing
    /// the same backing remotes. `None` for a system-scope store: the
    /// "already installed" check only ever defers upward, never sideways.
    fn system_store(&self) -> Option<&dyn DeployStore>;
}

/// A related ref surfaced by the catalog alongside a primary ref (locale
/// extensions, debug data, etc).
#[derive(Debug, Clone)]
pub struct RelatedRef {
    /// The related ref itself.
    pub reference: Ref,
    /// Subpaths to request when materializing it.
    pub subpaths: Subpaths,
    /// Whether this candidate should actually be downloaded. Candidates
    /// with `download = false` only describe a relation used elsewhere
    /// (e.g. deletion) and are skipped by the Expander.
    pub download: bool,
}

/// The remote metadata/cache service.
pub trait Catalog: fmt::Debug {
    /// Fetch `reference`'s cached metadata (an ini-style keyfile's raw
    /// text) from `remote`, if available.
    fn fetch_ref_cache(
        &self,
        remote: &str,
        reference: &Ref,
    ) -> Result<Option<String>, TransactionError>;

    /// Related refs for `reference`/`remote` from the local cache only.
    fn find_local_related(
        &self,
        reference: &Ref,
        remote: &str,
    ) -> Result<Vec<RelatedRef>, TransactionError>;

    /// Related refs for `reference`/`remote`, consulting the remote directly.
    fn find_remote_related(
        &self,
        reference: &Ref,
        remote: &str,
    ) -> Result<Vec<RelatedRef>, TransactionError>;

    /// Which configured remotes offer `reference`.
    fn search_for_dependency(&self, reference: &Ref) -> Result<Vec<String>, TransactionError>;

    /// Create (or reuse) an origin remote pointing at an OCI `uri`/`tag`.
    /// Returns the remote's name.
    fn create_origin_remote(
        &self,
        id: &str,
        title: &str,
        reference: &Ref,
        uri: &str,
        tag: &str,
    ) -> Result<String, TransactionError>;

    /// Re-initialize the repository so a freshly created origin remote
    /// becomes visible to subsequent lookups.
    fn recreate_repo(&self) -> Result<(), TransactionError>;
}

/// Annotations read off an OCI manifest.
pub type OciAnnotations = BTreeMap<String, String>;

/// An open OCI registry session.
pub trait OciSession {
    /// Choose the image matching `tag` and return its annotations.
    fn choose_image(&mut self, tag: &str) -> Result<OciAnnotations, TransactionError>;
}

/// Entry point for OCI registry access.
pub trait OciRegistryClient: fmt::Debug {
    /// Open a session against `uri`.
    fn open(&self, uri: &str) -> Result<Box<dyn OciSession>, TransactionError>;
}

/// The two commit-annotation keys this core looks for. A concrete registry
/// client is expected to have copied these verbatim from whatever manifest
/// annotation namespace its real registry uses; the core only cares about
/// the two logical fields.
pub const ANNOTATION_REF: &str = "ref";
/// See [`ANNOTATION_REF`].
pub const ANNOTATION_CHECKSUM: &str = "checksum";

/// Pull `(ref, checksum)` out of a manifest's annotations. Pure data extraction, so it lives as a free
/// function rather than a collaborator method.
pub fn parse_commit_annotations(annotations: &OciAnnotations) -> (Option<String>, Option<String>) {
    (
        annotations.get(ANNOTATION_REF).cloned(),
        annotations.get(ANNOTATION_CHECKSUM).cloned(),
    )
}

/// Interactive disambiguation.
pub trait UserPrompt: fmt::Debug {
    /// Ask a yes/no question.
    fn yes_no(&self, question: &str) -> bool;

    /// Ask the user to choose a number in `[lo, hi]`, where `lo` is the
    /// abort sentinel (callers pass `0` for this).
    fn choose_number(&self, lo: i32, hi: i32, question: &str) -> i32;
}

/// A [`UserPrompt`] that always aborts (returns the `lo` sentinel / `false`),
/// used as the safe default for non-interactive invocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompt;

impl UserPrompt for NonInteractivePrompt {
    fn yes_no(&self, _question: &str) -> bool {
        false
    }

    fn choose_number(&self, lo: i32, _hi: i32, _question: &str) -> i32 {
        lo
    }
}
