//! C4 — the Executor: walks the Op Table in insertion order, resolves
//! `InstallOrUpdate` ops against current deploy state, dispatches to the
//! deploy store, and applies the partial-failure policy.

use crate::collaborators::Cancellable;
use crate::error::TransactionError;
use crate::op::{Op, OpKind};
use crate::table::{OpHandle, OpTable};
use crate::transaction::External;

/// Truncate a commit hash to the 12-character prefix used in progress
/// messages.
fn short_commit(commit: &str) -> &str {
    &commit[..commit.len().min(12)]
}

/// Resolve an `InstallOrUpdate` op to a concrete `Install`/`Update` kind
/// based on whether the ref is deployed right now. Ops
/// recorded as plainly `Install` or `Update` pass through unchanged.
fn resolve_kind(op: &Op, external: External<'_>) -> OpKind {
    match op.kind {
        OpKind::InstallOrUpdate => {
            if external.deploy.is_deployed(&op.reference) {
                OpKind::Update
            } else {
                OpKind::Install
            }
        }
        other => other,
    }
}

/// Dispatch a single resolved op to the deploy store, printing the
/// corresponding progress line to the user.
fn dispatch(op: &Op, kind: OpKind, external: External<'_>, cancellable: &Cancellable) -> Result<(), TransactionError> {
    match kind {
        OpKind::Install => {
            println!("Installing: {} from {}", op.reference.pref(), op.remote);
            external.deploy.install(
                &op.reference,
                &op.remote,
                &op.subpaths,
                external.config.no_pull,
                external.config.no_deploy,
                cancellable,
            )?;
            Ok(())
        }
        OpKind::Update => {
            println!("Updating: {} from {}", op.reference.pref(), op.remote);
            external.deploy.update(
                &op.reference,
                &op.remote,
                op.commit.as_deref(),
                &op.subpaths,
                external.config.no_pull,
                external.config.no_deploy,
                cancellable,
            )?;
            match external.deploy.get_commit(&op.reference) {
                Some(commit) => println!("Now at {}.", short_commit(&commit)),
                None => println!("Updated {}.", op.reference.pref()),
            }
            Ok(())
        }
        OpKind::InstallOrUpdate => unreachable!("resolved before dispatch"),
    }
}

/// Run every op in `table` in insertion order.
///
/// Returns `Ok(true)` once every op has been attempted and none of the
/// fatal ones failed. If `stop_on_first_error` is `true`, the first fatal
/// failure's own error is returned immediately and later ops are not
/// attempted. If it is `false`, execution continues through the whole
/// batch and, if any fatal op failed, [`TransactionError::BatchFailed`] is
/// returned at the end. Non-fatal ops (from related-ref expansion) never
/// affect either outcome; their failures are only logged.
pub(crate) fn run(
    table: &OpTable,
    external: External<'_>,
    stop_on_first_error: bool,
    cancellable: &Cancellable,
) -> Result<bool, TransactionError> {
    let mut any_fatal_failure = false;

    for handle in table.iter() {
        let (kind, non_fatal) = {
            let op = handle.borrow();
            (resolve_kind(&op, external), op.non_fatal)
        };

        let result = run_one(handle, kind, external, cancellable);

        if let Err(err) = result {
            if non_fatal {
                eprintln!(
                    "Warning: {} {} failed: {err}",
                    handle.borrow().opname(),
                    handle.borrow().reference.pref()
                );
                continue;
            }
            eprintln!(
                "Error: {} {} failed: {err}",
                handle.borrow().opname(),
                handle.borrow().reference.pref()
            );
            if stop_on_first_error {
                return Err(err);
            }
            any_fatal_failure = true;
        }
    }

    if any_fatal_failure {
        Err(TransactionError::BatchFailed)
    } else {
        Ok(true)
    }
}

/// Run a single op, absorbing the update-noop sentinel into a `No updates.`
/// transcript line instead of propagating it as a failure.
fn run_one(
    handle: &OpHandle,
    kind: OpKind,
    external: External<'_>,
    cancellable: &Cancellable,
) -> Result<(), TransactionError> {
    let op = handle.borrow();
    match dispatch(&op, kind, external, cancellable) {
        Err(err) if kind == OpKind::Update && err.is_already_installed() => {
            println!("No updates.");
            Ok(())
        }
        other => other,
    }
}
