//! [`OciRegistryClient`] backed by a plain HTTPS `GET` for the manifest.
//! Real registries need token-exchange auth and content-negotiation
//! retries the full `distribution/reference` protocol defines; this client
//! assumes `uri` already resolves directly to a manifest-serving endpoint,
//! which is enough to drive `add_install_oci` end to end without pulling in
//! a full registry client crate.

use anyhow::Context;
use oci_spec::image::ImageManifest;
use reftx_core::{OciAnnotations, OciRegistryClient, OciSession, TransactionError};

fn to_transaction_error(context: &str, err: impl std::fmt::Display) -> TransactionError {
    TransactionError::Deploy(anyhow::anyhow!("{context}: {err}"))
}

/// Entry point for opening sessions against OCI-ish HTTP endpoints.
#[derive(Debug)]
pub struct HttpOciClient {
    http: reqwest::blocking::Client,
}

impl HttpOciClient {
    /// Build a client with sane defaults (a finite timeout; no retries —
    /// those are the caller's business via `Cancellable`).
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("building HTTP client")?;
        Ok(Self { http })
    }
}

impl OciRegistryClient for HttpOciClient {
    fn open(&self, uri: &str) -> Result<Box<dyn OciSession>, TransactionError> {
        Ok(Box::new(HttpOciSession {
            http: self.http.clone(),
            uri: uri.to_string(),
        }))
    }
}

struct HttpOciSession {
    http: reqwest::blocking::Client,
    uri: String,
}

impl OciSession for HttpOciSession {
    fn choose_image(&mut self, tag: &str) -> Result<OciAnnotations, TransactionError> {
        let url = format!("{}/manifests/{tag}", self.uri.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.oci.image.manifest.v1+json")
            .send()
            .map_err(|err| to_transaction_error("fetching manifest", err))?
            .error_for_status()
            .map_err(|err| to_transaction_error("fetching manifest", err))?;
        let manifest: ImageManifest = response
            .json()
            .map_err(|err| to_transaction_error("parsing manifest", err))?;
        Ok(manifest.annotations().clone().unwrap_or_default().into_iter().collect())
    }
}
