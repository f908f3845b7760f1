//! Transaction planner and executor for installing and updating sandboxed
//! refs from content-addressed remotes.
//!
//! A [`transaction::Transaction`] collects install/update/OCI-install
//! requests (C2, `src/intake.rs`) into an ordered, deduplicated
//! [`table::OpTable`] (C1, `src/table.rs`), optionally expanding each
//! request's runtime dependency and related refs along the way (C3,
//! `src/expand.rs`), and finally [`transaction::Transaction::run`]s every
//! recorded op against a caller-supplied [`collaborators::DeployStore`] (C4,
//! `src/executor.rs`).
//!
//! This crate has no opinion on how refs are stored, fetched, or deployed —
//! that's the `collaborators` traits' job. The `reftx` CLI crate supplies
//! concrete implementations.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(unsafe_code)]

mod collaborators;
mod config;
mod error;
mod executor;
mod expand;
mod intake;
mod op;
mod refs;
mod subpaths;
mod table;
mod transaction;

pub use collaborators::{
    parse_commit_annotations, Cancellable, Catalog, DeployStore, NonInteractivePrompt, OciAnnotations,
    OciRegistryClient, OciSession, RelatedRef, UserPrompt, ANNOTATION_CHECKSUM, ANNOTATION_REF,
};
pub use config::{TransactionConfig, TransactionConfigBuilder};
pub use error::TransactionError;
pub use op::{Op, OpKind};
pub use refs::{Ref, RefKind};
pub use subpaths::Subpaths;
pub use table::OpHandle;
pub use transaction::Transaction;
