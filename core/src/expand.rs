//! C3 — the Expander: runtime dependency expansion and related-ref
//! expansion, both run from inside the common intake path.

use crate::error::TransactionError;
use crate::intake::is_installed_scope_aware;
use crate::op::OpKind;
use crate::refs::Ref;
use crate::subpaths::Subpaths;
use crate::table::OpTable;
use crate::transaction::External;

/// Pull the `runtime=` value out of an app's `[Application]` metadata
/// section. `None` means the section or key is absent,
/// which is not an error: not every app declares a runtime.
fn parse_runtime_key(metadata: &str) -> Option<String> {
    let ini = tini::Ini::from_string(metadata).ok()?;
    ini.get("Application", "runtime")
}

/// Ensure `reference`'s declared runtime (if any) is installed or scheduled
/// for install, recursing only one level deep — runtimes never declare
/// their own runtime dependency in this model.
pub(crate) fn add_deps(
    table: &mut OpTable,
    external: External<'_>,
    remote: &str,
    reference: &Ref,
) -> Result<(), TransactionError> {
    if !reference.is_app() {
        return Ok(());
    }

    let metadata = match external.catalog.fetch_ref_cache(remote, reference)? {
        Some(metadata) => metadata,
        None => return Ok(()),
    };
    let runtime_value = match parse_runtime_key(&metadata) {
        Some(value) => value,
        None => return Ok(()),
    };
    let runtime_ref = Ref::runtime(&runtime_value)?;

    if table.contains(&runtime_ref) {
        return Ok(());
    }

    // Set in both branches below: a runtime already installed elsewhere
    // still gets its related refs considered, the same as one this
    // transaction is about to install.
    let mut runtime_remote: Option<String> = None;

    if !is_installed_scope_aware(external.deploy, &runtime_ref) {
        tracing::debug!(
            "{} requires runtime {} which is not installed, searching remotes",
            reference.pref(),
            runtime_value,
        );
        let candidates = external.catalog.search_for_dependency(&runtime_ref)?;
        let chosen = if candidates.is_empty() {
            eprintln!("Warning: the runtime {runtime_value} is not installed, and no remote was found providing it.");
            None
        } else {
            ask_for_remote(external, &candidates)
        };
        let chosen = chosen.ok_or_else(|| TransactionError::MissingRuntime {
            app_pref: reference.pref().to_owned(),
            runtime_pref: runtime_value,
        })?;
        table.add_op(chosen.clone(), runtime_ref.clone(), Subpaths::Inherit, None, OpKind::InstallOrUpdate);
        runtime_remote = Some(chosen);
    } else if let Some(origin) = external.deploy.get_origin(&runtime_ref) {
        table.add_op(origin.clone(), runtime_ref.clone(), Subpaths::Inherit, None, OpKind::Update);
        runtime_remote = Some(origin);
    }

    if let Some(runtime_remote) = runtime_remote {
        if external.config.add_related {
            add_related(table, external, &runtime_remote, &runtime_ref);
        }
    }

    Ok(())
}

/// Ask the user which of one or more candidate remotes to install from.
/// Returns `None` if the user declines or the prompt implementation is
/// non-interactive.
fn ask_for_remote(external: External<'_>, candidates: &[String]) -> Option<String> {
    if let [only] = candidates {
        if external
            .prompt
            .yes_no(&format!("Found in remote {only}, do you want to install it?"))
        {
            return Some(only.clone());
        }
        return None;
    }

    println!("Found in several remotes:");
    for (index, remote) in candidates.iter().enumerate() {
        println!("{}) {remote}", index + 1);
    }
    let chosen = external
        .prompt
        .choose_number(0, candidates.len() as i32, "Which do you want to install (0 to abort)?");
    if chosen == 0 {
        None
    } else {
        candidates.get((chosen - 1) as usize).cloned()
    }
}

/// Add related refs (locale extensions, debug info, ...) for `reference` as
/// non-fatal ops. Failures here are
/// logged and swallowed; they never fail the caller's intake request.
pub(crate) fn add_related(table: &mut OpTable, external: External<'_>, remote: &str, reference: &Ref) {
    let result = if external.config.no_pull {
        external.catalog.find_local_related(reference, remote)
    } else {
        external.catalog.find_remote_related(reference, remote)
    };

    let related = match result {
        Ok(related) => related,
        Err(err) => {
            eprintln!("Warning: problem looking for related refs: {err}");
            return;
        }
    };

    for candidate in related {
        if !candidate.download {
            continue;
        }
        let op = table.add_op(
            remote.to_string(),
            candidate.reference,
            candidate.subpaths,
            None,
            OpKind::InstallOrUpdate,
        );
        op.borrow_mut().non_fatal = true;
    }
}
