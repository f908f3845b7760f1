//! C2 — Request Intake: validates a caller's install/update/OCI request and
//! records it in the Op Table, running dependency and related-ref expansion
//! along the way.

use crate::collaborators::{parse_commit_annotations, DeployStore};
use crate::error::TransactionError;
use crate::expand;
use crate::op::OpKind;
use crate::refs::Ref;
use crate::subpaths::Subpaths;
use crate::table::OpHandle;
use crate::transaction::External;

/// The scope-aware "already installed" check: deployed here, or — for a user-scope
/// transaction only — deployed in the system scope it defers to. Never
/// consulted in the other direction: a system-scope transaction never looks
/// at user scope.
pub(crate) fn is_installed_scope_aware(deploy: &dyn DeployStore, reference: &Ref) -> bool {
    if deploy.is_deployed(reference) {
        return true;
    }
    deploy.is_user_scope()
        && deploy
            .system_store()
            .is_some_and(|system| system.is_deployed(reference))
}

/// Add an install request.
pub(crate) fn add_install(
    table: &mut crate::table::OpTable,
    external: External<'_>,
    remote: &str,
    reference: Ref,
    subpaths: Option<Subpaths>,
) -> Result<OpHandle, TransactionError> {
    if remote.is_empty() {
        return Err(TransactionError::InvalidRequest(format!(
            "{}: a remote is required to install",
            reference.pref()
        )));
    }
    let subpaths = Subpaths::from_install_request(subpaths);
    let op = add_ref_common(table, external, Some(remote.to_string()), reference, subpaths, None, false)?;
    // Install requests always produce an op: the disabled-remote skip only
    // applies to updates, whose origin is resolved from existing deploy
    // state rather than supplied by the caller.
    Ok(op.expect("install path always records an op"))
}

/// Add an update request. The remote is not known until the
/// common path looks up the ref's recorded origin.
///
/// Returns `Ok(None)` with no Op Table entry created if the resolved origin
/// remote is administratively disabled.
pub(crate) fn add_update(
    table: &mut crate::table::OpTable,
    external: External<'_>,
    reference: Ref,
    subpaths: Option<Subpaths>,
    commit: Option<String>,
) -> Result<Option<OpHandle>, TransactionError> {
    let subpaths = subpaths.unwrap_or(Subpaths::Inherit);
    add_ref_common(table, external, None, reference, subpaths, commit, true)
}

/// Add an install sourced from an OCI image.
pub(crate) fn add_install_oci(
    table: &mut crate::table::OpTable,
    external: External<'_>,
    uri: &str,
    tag: &str,
) -> Result<OpHandle, TransactionError> {
    let mut session = external.oci.open(uri)?;
    let annotations = session.choose_image(tag)?;
    // `session` is dropped here regardless of which branch below returns
    // early, since it is a local binding with no further uses past this
    // point — ordinary Rust drop order, not anything we arrange by hand.
    let (reference_str, checksum) = parse_commit_annotations(&annotations);
    let reference_str = reference_str.ok_or_else(|| TransactionError::InvalidOciImage(uri.to_string()))?;
    let reference = Ref::new(reference_str)?;

    // The name is the second segment of the decomposed ref (kind/name/arch/branch).
    let name = reference.pref().split('/').next().unwrap_or_default();
    let id = format!("oci-{name}");
    let title = format!("OCI remote for {name}");
    let remote = external.catalog.create_origin_remote(&id, &title, &reference, uri, tag)?;
    external.catalog.recreate_repo()?;
    tracing::debug!("added OCI origin remote {remote} ({uri}:{tag})");

    let op = add_ref_common(table, external, Some(remote), reference, Subpaths::All, checksum, false)?;
    Ok(op.expect("install path always records an op"))
}

/// The common tail of every intake entry point: resolve the
/// remote, check scope, run dependency/related expansion, and record the op.
fn add_ref_common(
    table: &mut crate::table::OpTable,
    external: External<'_>,
    remote: Option<String>,
    reference: Ref,
    subpaths: Subpaths,
    commit: Option<String>,
    is_update: bool,
) -> Result<Option<OpHandle>, TransactionError> {
    let pref = reference.pref().to_owned();

    let remote = if is_update {
        let origin = external
            .deploy
            .get_origin(&reference)
            .ok_or_else(|| TransactionError::NotInstalled { pref: pref.clone() })?;
        if external.deploy.is_remote_disabled(&origin) {
            tracing::debug!("remote {origin} is disabled, silently skipping update of {pref}");
            return Ok(None);
        }
        origin
    } else {
        if is_installed_scope_aware(external.deploy, &reference) {
            return Err(TransactionError::AlreadyInstalled { pref });
        }
        remote.expect("non-update callers always supply a remote")
    };

    if external.config.add_deps {
        expand::add_deps(table, external, &remote, &reference)?;
    }

    let op = table.add_op(
        remote.clone(),
        reference.clone(),
        subpaths,
        commit,
        if is_update { OpKind::Update } else { OpKind::Install },
    );

    if external.config.add_related {
        expand::add_related(table, external, &remote, &reference);
    }

    Ok(Some(op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Cancellable, Catalog, NonInteractivePrompt, OciRegistryClient, RelatedRef};
    use crate::config::TransactionConfig;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Debug, Default)]
    struct FakeDeploy {
        deployed: RefCell<BTreeMap<String, String>>,
        user_scope: bool,
        disabled_remotes: Vec<String>,
    }

    impl DeployStore for FakeDeploy {
        fn is_deployed(&self, reference: &Ref) -> bool {
            self.deployed.borrow().contains_key(reference.as_str())
        }
        fn get_origin(&self, reference: &Ref) -> Option<String> {
            self.deployed.borrow().get(reference.as_str()).cloned()
        }
        fn get_commit(&self, _reference: &Ref) -> Option<String> {
            None
        }
        fn is_remote_disabled(&self, remote: &str) -> bool {
            self.disabled_remotes.iter().any(|r| r == remote)
        }
        fn install(
            &self,
            reference: &Ref,
            remote: &str,
            _subpaths: &Subpaths,
            _no_pull: bool,
            _no_deploy: bool,
            _cancellable: &Cancellable,
        ) -> Result<(), TransactionError> {
            self.deployed
                .borrow_mut()
                .insert(reference.as_str().to_owned(), remote.to_owned());
            Ok(())
        }
        fn update(
            &self,
            _reference: &Ref,
            _remote: &str,
            _commit: Option<&str>,
            _subpaths: &Subpaths,
            _no_pull: bool,
            _no_deploy: bool,
            _cancellable: &Cancellable,
        ) -> Result<(), TransactionError> {
            Ok(())
        }
        fn is_user_scope(&self) -> bool {
            self.user_scope
        }
        fn system_store(&self) -> Option<&dyn DeployStore> {
            None
        }
    }

    #[derive(Debug, Default)]
    struct FakeCatalog;

    impl Catalog for FakeCatalog {
        fn fetch_ref_cache(&self, _remote: &str, _reference: &Ref) -> Result<Option<String>, TransactionError> {
            Ok(None)
        }
        fn find_local_related(&self, _reference: &Ref, _remote: &str) -> Result<Vec<RelatedRef>, TransactionError> {
            Ok(vec![])
        }
        fn find_remote_related(&self, _reference: &Ref, _remote: &str) -> Result<Vec<RelatedRef>, TransactionError> {
            Ok(vec![])
        }
        fn search_for_dependency(&self, _reference: &Ref) -> Result<Vec<String>, TransactionError> {
            Ok(vec![])
        }
        fn create_origin_remote(
            &self,
            id: &str,
            _title: &str,
            _reference: &Ref,
            _uri: &str,
            _tag: &str,
        ) -> Result<String, TransactionError> {
            Ok(id.to_string())
        }
        fn recreate_repo(&self) -> Result<(), TransactionError> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct FakeOci;

    impl OciRegistryClient for FakeOci {
        fn open(&self, _uri: &str) -> Result<Box<dyn crate::collaborators::OciSession>, TransactionError> {
            unreachable!("not exercised by these tests")
        }
    }

    fn r(s: &str) -> Ref {
        Ref::new(s).unwrap()
    }

    #[test]
    fn install_rejects_empty_remote() {
        let deploy = FakeDeploy::default();
        let catalog = FakeCatalog::default();
        let oci = FakeOci::default();
        let config = TransactionConfig::default();
        let external = External {
            deploy: &deploy,
            catalog: &catalog,
            oci: &oci,
            prompt: &NonInteractivePrompt,
            config: &config,
        };
        let mut table = crate::table::OpTable::new();
        let err = add_install(&mut table, external, "", r("app/com.example.Foo/x86_64/stable"), None).unwrap_err();
        assert!(matches!(err, TransactionError::InvalidRequest(_)));
    }

    #[test]
    fn install_already_deployed_fails() {
        let deploy = FakeDeploy::default();
        let reference = r("app/com.example.Foo/x86_64/stable");
        deploy
            .deployed
            .borrow_mut()
            .insert(reference.as_str().to_owned(), "origin".into());
        let catalog = FakeCatalog::default();
        let oci = FakeOci::default();
        let config = TransactionConfig::default();
        let external = External {
            deploy: &deploy,
            catalog: &catalog,
            oci: &oci,
            prompt: &NonInteractivePrompt,
            config: &config,
        };
        let mut table = crate::table::OpTable::new();
        let err = add_install(&mut table, external, "origin", reference, None).unwrap_err();
        assert!(matches!(err, TransactionError::AlreadyInstalled { .. }));
    }

    #[test]
    fn update_not_installed_fails() {
        let deploy = FakeDeploy::default();
        let catalog = FakeCatalog::default();
        let oci = FakeOci::default();
        let config = TransactionConfig::default();
        let external = External {
            deploy: &deploy,
            catalog: &catalog,
            oci: &oci,
            prompt: &NonInteractivePrompt,
            config: &config,
        };
        let mut table = crate::table::OpTable::new();
        let err = add_update(&mut table, external, r("app/com.example.Foo/x86_64/stable"), None, None).unwrap_err();
        assert!(matches!(err, TransactionError::NotInstalled { .. }));
    }

    #[test]
    fn update_on_disabled_remote_is_silently_skipped() {
        let deploy = FakeDeploy {
            disabled_remotes: vec!["origin".into()],
            ..Default::default()
        };
        let reference = r("app/com.example.Foo/x86_64/stable");
        deploy
            .deployed
            .borrow_mut()
            .insert(reference.as_str().to_owned(), "origin".into());
        let catalog = FakeCatalog::default();
        let oci = FakeOci::default();
        let config = TransactionConfig::default();
        let external = External {
            deploy: &deploy,
            catalog: &catalog,
            oci: &oci,
            prompt: &NonInteractivePrompt,
            config: &config,
        };
        let mut table = crate::table::OpTable::new();
        let op = add_update(&mut table, external, reference, None, None).unwrap();
        assert!(op.is_none());
        assert_eq!(table.len(), 0);
    }
}
