//! On-disk remote configuration shared by [`crate::state::FileDeployStore`]
//! and [`crate::catalog::FileCatalog`]: a single `remotes.toml` listing every
//! configured remote, what it offers, and whether it is administratively
//! disabled. Deliberately modest — a directory-of-remotes catalog backed by
//! a real database is out of scope for this CLI.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// A single configured remote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Human-readable title, e.g. "Flathub" or "OCI remote for com.example.Foo".
    pub title: String,
    /// The URI this remote pulls from.
    pub url: String,
    /// OCI tag, set only for remotes created by `add_install_oci`.
    #[serde(default)]
    pub tag: Option<String>,
    /// If true, `add_update` silently skips refs originating here.
    #[serde(default)]
    pub disabled: bool,
    /// Refs this remote is known to provide, consulted by
    /// `search_for_dependency`.
    #[serde(default)]
    pub provides: Vec<String>,
}

/// The full `remotes.toml` document: remote id -> entry.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RemotesConfig {
    /// Configured remotes keyed by id.
    #[serde(default)]
    pub remote: BTreeMap<String, RemoteEntry>,
}

impl RemotesConfig {
    /// Load `remotes.toml` from `path`, or an empty config if it doesn't
    /// exist yet (a fresh install has no remotes configured).
    pub fn load(path: &Utf8Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).with_context(|| format!("parsing {path}")),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("reading {path}")),
        }
    }

    /// Persist this config back to `path`, creating parent directories as
    /// needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {parent}"))?;
        }
        let serialized = toml::to_string_pretty(self).context("serializing remotes.toml")?;
        std::fs::write(path, serialized).with_context(|| format!("writing {path}"))
    }

    /// Remotes (ids) that list `reference` in their `provides` list.
    pub fn providers_of(&self, reference: &str) -> Vec<String> {
        self.remote
            .iter()
            .filter(|(_, entry)| entry.provides.iter().any(|p| p == reference))
            .map(|(id, _)| id.clone())
            .collect()
    }
}
