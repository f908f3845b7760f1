//! The transaction's immutable-after-construction configuration.

/// Options fixed at `Transaction` construction time. `stop_on_first_error`
/// is deliberately not here: it's a parameter to `run` itself rather than a
/// construction-time option (see DESIGN.md for the reasoning).
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionConfig {
    /// Skip network fetch; require content already local.
    pub no_pull: bool,
    /// Fetch but do not activate on disk.
    pub no_deploy: bool,
    /// Enable runtime dependency expansion (C3).
    pub add_deps: bool,
    /// Enable related-ref expansion (C3).
    pub add_related: bool,
}

impl TransactionConfig {
    /// Start building a config with every option off.
    pub fn builder() -> TransactionConfigBuilder {
        TransactionConfigBuilder::default()
    }
}

/// Builder for [`TransactionConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionConfigBuilder {
    inner: TransactionConfig,
}

impl TransactionConfigBuilder {
    /// See [`TransactionConfig::no_pull`].
    pub fn no_pull(mut self, value: bool) -> Self {
        self.inner.no_pull = value;
        self
    }

    /// See [`TransactionConfig::no_deploy`].
    pub fn no_deploy(mut self, value: bool) -> Self {
        self.inner.no_deploy = value;
        self
    }

    /// See [`TransactionConfig::add_deps`].
    pub fn add_deps(mut self, value: bool) -> Self {
        self.inner.add_deps = value;
        self
    }

    /// See [`TransactionConfig::add_related`].
    pub fn add_related(mut self, value: bool) -> Self {
        self.inner.add_related = value;
        self
    }

    /// Finish building.
    pub fn build(self) -> TransactionConfig {
        self.inner
    }
}
