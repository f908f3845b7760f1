//! Hand-rolled mock collaborators shared by the scenario tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use reftx_core::{
    Cancellable, Catalog, DeployStore, OciAnnotations, OciRegistryClient, OciSession, Ref, RelatedRef, Subpaths,
    TransactionError, UserPrompt,
};

/// An in-memory deploy store. `deployed` maps ref string to `(origin,
/// commit)`. `disabled_remotes` models administratively-disabled remotes.
/// `noop_update` marks refs for which `update` should report the
/// already-up-to-date sentinel instead of succeeding.
#[derive(Debug, Default)]
pub struct MockDeployStore {
    pub deployed: RefCell<BTreeMap<String, (String, String)>>,
    pub disabled_remotes: BTreeSet<String>,
    pub noop_update: BTreeSet<String>,
    pub user_scope: bool,
    pub fail_install: BTreeSet<String>,
}

impl DeployStore for MockDeployStore {
    fn is_deployed(&self, reference: &Ref) -> bool {
        self.deployed.borrow().contains_key(reference.as_str())
    }

    fn get_origin(&self, reference: &Ref) -> Option<String> {
        self.deployed.borrow().get(reference.as_str()).map(|(origin, _)| origin.clone())
    }

    fn get_commit(&self, reference: &Ref) -> Option<String> {
        self.deployed.borrow().get(reference.as_str()).map(|(_, commit)| commit.clone())
    }

    fn is_remote_disabled(&self, remote: &str) -> bool {
        self.disabled_remotes.contains(remote)
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
        if self.fail_install.contains(reference.as_str()) {
            return Err(TransactionError::Deploy(anyhow::anyhow!("simulated install failure")));
        }
        self.deployed
            .borrow_mut()
            .insert(reference.as_str().to_owned(), (remote.to_owned(), "0".repeat(40)));
        Ok(())
    }

    fn update(
        &self,
        reference: &Ref,
        remote: &str,
        commit: Option<&str>,
        _subpaths: &Subpaths,
        _no_pull: bool,
        _no_deploy: bool,
        _cancellable: &Cancellable,
    ) -> Result<(), TransactionError> {
        if self.noop_update.contains(reference.as_str()) {
            return Err(TransactionError::AlreadyInstalled {
                pref: reference.pref().to_owned(),
            });
        }
        let new_commit = commit.map(str::to_owned).unwrap_or_else(|| "1".repeat(40));
        self.deployed
            .borrow_mut()
            .insert(reference.as_str().to_owned(), (remote.to_owned(), new_commit));
        Ok(())
    }

    fn is_user_scope(&self) -> bool {
        self.user_scope
    }

    fn system_store(&self) -> Option<&dyn DeployStore> {
        None
    }
}

/// A deploy store that defers to a separate system-scope store, for testing
/// the scope-asymmetric install check.
#[derive(Debug)]
pub struct MockUserDeployStore<'a> {
    pub own: MockDeployStore,
    pub system: &'a MockDeployStore,
}

impl<'a> DeployStore for MockUserDeployStore<'a> {
    fn is_deployed(&self, reference: &Ref) -> bool {
        self.own.is_deployed(reference)
    }
    fn get_origin(&self, reference: &Ref) -> Option<String> {
        self.own.get_origin(reference)
    }
    fn get_commit(&self, reference: &Ref) -> Option<String> {
        self.own.get_commit(reference)
    }
    fn is_remote_disabled(&self, remote: &str) -> bool {
        self.own.is_remote_disabled(remote)
    }
    fn install(
        &self,
        reference: &Ref,
        remote: &str,
        subpaths: &Subpaths,
        no_pull: bool,
        no_deploy: bool,
        cancellable: &Cancellable,
    ) -> Result<(), TransactionError> {
        self.own.install(reference, remote, subpaths, no_pull, no_deploy, cancellable)
    }
    fn update(
        &self,
        reference: &Ref,
        remote: &str,
        commit: Option<&str>,
        subpaths: &Subpaths,
        no_pull: bool,
        no_deploy: bool,
        cancellable: &Cancellable,
    ) -> Result<(), TransactionError> {
        self.own
            .update(reference, remote, commit, subpaths, no_pull, no_deploy, cancellable)
    }
    fn is_user_scope(&self) -> bool {
        true
    }
    fn system_store(&self) -> Option<&dyn DeployStore> {
        Some(self.system)
    }
}

/// A catalog backed by plain in-memory tables, configured per test.
#[derive(Debug, Default)]
pub struct MockCatalog {
    /// `(remote, ref)` -> raw ini-style metadata text.
    pub metadata: BTreeMap<(String, String), String>,
    /// ref -> remotes offering it, for dependency search.
    pub providers: BTreeMap<String, Vec<String>>,
    /// `(remote, ref)` -> related refs.
    pub related: BTreeMap<(String, String), Vec<RelatedRef>>,
}

impl Catalog for MockCatalog {
    fn fetch_ref_cache(&self, remote: &str, reference: &Ref) -> Result<Option<String>, TransactionError> {
        Ok(self.metadata.get(&(remote.to_owned(), reference.as_str().to_owned())).cloned())
    }

    fn find_local_related(&self, reference: &Ref, remote: &str) -> Result<Vec<RelatedRef>, TransactionError> {
        self.find_remote_related(reference, remote)
    }

    fn find_remote_related(&self, reference: &Ref, remote: &str) -> Result<Vec<RelatedRef>, TransactionError> {
        Ok(self
            .related
            .get(&(remote.to_owned(), reference.as_str().to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    fn search_for_dependency(&self, reference: &Ref) -> Result<Vec<String>, TransactionError> {
        Ok(self.providers.get(reference.as_str()).cloned().unwrap_or_default())
    }

    fn create_origin_remote(
        &self,
        id: &str,
        _title: &str,
        _reference: &Ref,
        _uri: &str,
        _tag: &str,
    ) -> Result<String, TransactionError> {
        Ok(id.to_owned())
    }

    fn recreate_repo(&self) -> Result<(), TransactionError> {
        Ok(())
    }
}

/// A canned OCI session returning a fixed set of manifest annotations.
#[derive(Debug, Clone, Default)]
pub struct MockOciSession {
    pub annotations: OciAnnotations,
}

impl OciSession for MockOciSession {
    fn choose_image(&mut self, _tag: &str) -> Result<OciAnnotations, TransactionError> {
        Ok(self.annotations.clone())
    }
}

/// An OCI client that always opens the same canned session.
#[derive(Debug, Default)]
pub struct MockOciClient {
    pub session: MockOciSession,
}

impl OciRegistryClient for MockOciClient {
    fn open(&self, _uri: &str) -> Result<Box<dyn OciSession>, TransactionError> {
        Ok(Box::new(self.session.clone()))
    }
}

/// A scripted prompt: replies come from a fixed queue, in order.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub yes_no_replies: RefCell<Vec<bool>>,
    pub number_replies: RefCell<Vec<i32>>,
}

impl UserPrompt for ScriptedPrompt {
    fn yes_no(&self, _question: &str) -> bool {
        self.yes_no_replies.borrow_mut().pop().unwrap_or(false)
    }

    fn choose_number(&self, lo: i32, _hi: i32, _question: &str) -> i32 {
        self.number_replies.borrow_mut().pop().unwrap_or(lo)
    }
}
