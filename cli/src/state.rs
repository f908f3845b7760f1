//! [`DeployStore`] backed by a JSON state file plus the shared
//! `remotes.toml`. This stands in for the real deploy engine that actually
//! pulls content and writes it to disk, which is out of scope for the core
//! crate; it "deploys" a ref by recording a synthetic commit rather than
//! fetching and unpacking real content, which is enough to drive the
//! planner end to end without a real sandboxed-runtime backend.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use fn_error_context::context;
use reftx_core::{Cancellable, DeployStore, Ref, Subpaths, TransactionError};
use serde::{Deserialize, Serialize};

use crate::remotes::RemotesConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeployedRef {
    origin: String,
    commit: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    deployed: BTreeMap<String, DeployedRef>,
}

impl StateFile {
    #[context("loading deploy state from {path}")]
    fn load(path: &Utf8PathBuf) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).context("parsing state file"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).context("reading state file"),
        }
    }

    #[context("saving deploy state to {path}")]
    fn save(&self, path: &Utf8PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("creating state directory")?;
        }
        let serialized = serde_json::to_string_pretty(self).context("serializing state file")?;
        std::fs::write(path, serialized).context("writing state file")
    }
}

/// A single installation scope (user or system), each with its own state
/// file and a shared view of `remotes.toml`.
#[derive(Debug)]
pub struct FileDeployStore {
    state_path: Utf8PathBuf,
    remotes_path: Utf8PathBuf,
    state: RefCell<StateFile>,
    user_scope: bool,
    system: Option<Box<FileDeployStore>>,
}

impl FileDeployStore {
    /// Open the user-scope store at `state_path`, wired to fall back to a
    /// system-scope store at `system_state_path` for the scope-isolation
    /// check on install.
    pub fn open_user(
        state_path: Utf8PathBuf,
        remotes_path: Utf8PathBuf,
        system_state_path: Utf8PathBuf,
        system_remotes_path: Utf8PathBuf,
    ) -> Result<Self> {
        let system = Self::open_system(system_state_path, system_remotes_path)?;
        Ok(Self {
            state: RefCell::new(StateFile::load(&state_path)?),
            state_path,
            remotes_path,
            user_scope: true,
            system: Some(Box::new(system)),
        })
    }

    /// Open a system-scope store, which never defers to another scope.
    pub fn open_system(state_path: Utf8PathBuf, remotes_path: Utf8PathBuf) -> Result<Self> {
        Ok(Self {
            state: RefCell::new(StateFile::load(&state_path)?),
            state_path,
            remotes_path,
            user_scope: false,
            system: None,
        })
    }

    fn remotes(&self) -> Result<RemotesConfig> {
        RemotesConfig::load(&self.remotes_path)
    }

    /// A synthetic, stable-looking commit id: not cryptographically
    /// meaningful (there is no real content to hash), just distinct per
    /// (ref, remote) pair and long enough for `executor::short_commit`'s
    /// 12-character truncation to read naturally in the CLI transcript.
    fn synthesize_commit(reference: &Ref, remote: &str) -> String {
        let mut hasher = DefaultHasher::new();
        reference.as_str().hash(&mut hasher);
        remote.hash(&mut hasher);
        let mut commit = String::new();
        for salt in 0u8..3 {
            let mut h = DefaultHasher::new();
            (hasher.finish(), salt).hash(&mut h);
            commit.push_str(&format!("{:016x}", h.finish()));
        }
        commit
    }
}

impl DeployStore for FileDeployStore {
    fn is_deployed(&self, reference: &Ref) -> bool {
        self.state.borrow().deployed.contains_key(reference.as_str())
    }

    fn get_origin(&self, reference: &Ref) -> Option<String> {
        self.state
            .borrow()
            .deployed
            .get(reference.as_str())
            .map(|d| d.origin.clone())
    }

    fn get_commit(&self, reference: &Ref) -> Option<String> {
        self.state
            .borrow()
            .deployed
            .get(reference.as_str())
            .map(|d| d.commit.clone())
    }

    fn is_remote_disabled(&self, remote: &str) -> bool {
        self.remotes()
            .ok()
            .and_then(|cfg| cfg.remote.get(remote).map(|r| r.disabled))
            .unwrap_or(false)
    }

    fn install(
        &self,
        reference: &Ref,
        remote: &str,
        _subpaths: &Subpaths,
        no_pull: bool,
        no_deploy: bool,
        cancellable: &Cancellable,
    ) -> Result<(), TransactionError> {
        if self.is_deployed(reference) {
            return Err(TransactionError::AlreadyInstalled {
                pref: reference.pref().to_owned(),
            });
        }
        if cancellable.is_cancelled() {
            return Err(TransactionError::Deploy(anyhow::anyhow!("cancelled")));
        }
        if no_pull {
            return Err(TransactionError::Deploy(anyhow::anyhow!(
                "{}: no_pull set but content is not local",
                reference.pref()
            )));
        }
        if no_deploy {
            tracing::debug!("no_deploy set, not recording {} as deployed", reference);
            return Ok(());
        }
        let commit = Self::synthesize_commit(reference, remote);
        self.state.borrow_mut().deployed.insert(
            reference.as_str().to_owned(),
            DeployedRef {
                origin: remote.to_owned(),
                commit,
            },
        );
        self.state.borrow().save(&self.state_path).map_err(TransactionError::Deploy)
    }

    fn update(
        &self,
        reference: &Ref,
        remote: &str,
        commit: Option<&str>,
        _subpaths: &Subpaths,
        no_pull: bool,
        no_deploy: bool,
        cancellable: &Cancellable,
    ) -> Result<(), TransactionError> {
        if !self.is_deployed(reference) {
            return Err(TransactionError::NotInstalled {
                pref: reference.pref().to_owned(),
            });
        }
        if cancellable.is_cancelled() {
            return Err(TransactionError::Deploy(anyhow::anyhow!("cancelled")));
        }
        let new_commit = commit.map(str::to_owned).unwrap_or_else(|| {
            let mut bumped = Self::synthesize_commit(reference, remote);
            bumped.push('1');
            bumped.truncate(48);
            bumped
        });
        if self.get_commit(reference).as_deref() == Some(new_commit.as_str()) {
            return Err(TransactionError::AlreadyInstalled {
                pref: reference.pref().to_owned(),
            });
        }
        if no_pull {
            return Err(TransactionError::Deploy(anyhow::anyhow!(
                "{}: no_pull set but content is not local",
                reference.pref()
            )));
        }
        if no_deploy {
            return Ok(());
        }
        self.state.borrow_mut().deployed.insert(
            reference.as_str().to_owned(),
            DeployedRef {
                origin: remote.to_owned(),
                commit: new_commit,
            },
        );
        self.state.borrow().save(&self.state_path).map_err(TransactionError::Deploy)
    }

    fn is_user_scope(&self) -> bool {
        self.user_scope
    }

    fn system_store(&self) -> Option<&dyn DeployStore> {
        self.system.as_deref().map(|s| s as &dyn DeployStore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(dir: &tempfile::TempDir) -> (Utf8PathBuf, Utf8PathBuf) {
        let base = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        (base.join("state.json"), base.join("remotes.toml"))
    }

    #[test]
    fn install_then_reopen_sees_the_same_state() {
        let dir = tempfile::tempdir().unwrap();
        let (state_path, remotes_path) = paths(&dir);
        let reference = Ref::new("app/com.example.Foo/x86_64/stable").unwrap();
        {
            let store = FileDeployStore::open_system(state_path.clone(), remotes_path.clone()).unwrap();
            store
                .install(&reference, "origin", &Subpaths::All, false, false, &Cancellable::new())
                .unwrap();
        }
        let reopened = FileDeployStore::open_system(state_path, remotes_path).unwrap();
        assert!(reopened.is_deployed(&reference));
        assert_eq!(reopened.get_origin(&reference), Some("origin".to_owned()));
    }

    #[test]
    fn install_twice_fails_already_installed() {
        let dir = tempfile::tempdir().unwrap();
        let (state_path, remotes_path) = paths(&dir);
        let reference = Ref::new("app/com.example.Foo/x86_64/stable").unwrap();
        let store = FileDeployStore::open_system(state_path, remotes_path).unwrap();
        store
            .install(&reference, "origin", &Subpaths::All, false, false, &Cancellable::new())
            .unwrap();
        let err = store
            .install(&reference, "origin", &Subpaths::All, false, false, &Cancellable::new())
            .unwrap_err();
        assert!(matches!(err, TransactionError::AlreadyInstalled { .. }));
    }

    #[test]
    fn update_of_undeployed_ref_fails_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let (state_path, remotes_path) = paths(&dir);
        let reference = Ref::new("app/com.example.Foo/x86_64/stable").unwrap();
        let store = FileDeployStore::open_system(state_path, remotes_path).unwrap();
        let err = store
            .update(&reference, "origin", None, &Subpaths::All, false, false, &Cancellable::new())
            .unwrap_err();
        assert!(matches!(err, TransactionError::NotInstalled { .. }));
    }

    #[test]
    fn no_deploy_install_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let (state_path, remotes_path) = paths(&dir);
        let reference = Ref::new("app/com.example.Foo/x86_64/stable").unwrap();
        let store = FileDeployStore::open_system(state_path, remotes_path).unwrap();
        store
            .install(&reference, "origin", &Subpaths::All, false, true, &Cancellable::new())
            .unwrap();
        assert!(!store.is_deployed(&reference));
    }
}
