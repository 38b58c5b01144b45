//! HTTP acquisition of the remote datasets.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::path::Path;
use tracing::{debug, info};

use crate::error::{ReportError, Result};

/// GETs `url` and returns the response body. Transport failures and
/// non-success statuses are both reported as [`ReportError::Network`].
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ReportError::Config(format!("invalid source URL {url}: {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let network = |source| ReportError::Network {
        url: url.to_string(),
        source,
    };

    let resp = client.execute(req).await.map_err(network)?;
    debug!(status = %resp.status(), "Response received");
    let resp = resp.error_for_status().map_err(network)?;
    let bytes = resp.bytes().await.map_err(network)?;
    Ok(bytes.to_vec())
}

/// Fetches `url` and writes the body verbatim to `path`, replacing any
/// previous download.
#[tracing::instrument(skip(client, path), fields(path = %path.display()))]
pub async fn download_to<C: HttpClient>(client: &C, url: &str, path: &Path) -> Result<usize> {
    let bytes = fetch_bytes(client, url).await?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    std::fs::write(path, &bytes).map_err(|e| ReportError::io(path, e))?;

    info!(bytes = bytes.len(), "Dataset downloaded");
    Ok(bytes.len())
}
