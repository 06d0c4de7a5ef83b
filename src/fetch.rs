//! Two-line element downloads from CelesTrak into the lab cache.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_GROUP: &str = "active";
const TIMEOUT: Duration = Duration::from_secs(30);

pub fn celestrak_url(group: &str) -> String {
    format!(
        "https://celestrak.org/NORAD/elements/gp.php?GROUP={}&FORMAT=tle",
        group.to_uppercase()
    )
}

pub fn cache_path(cache_dir: &Path, group: &str) -> PathBuf {
    cache_dir.join(format!("celestrak_{}.tle", group.to_lowercase()))
}

/// Download one group and return the written path and byte count.
pub fn fetch_group(cache_dir: &Path, group: &str) -> Result<(PathBuf, usize)> {
    let url = celestrak_url(group);
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .http_status_as_error(false)
        .build()
        .into();
    let mut response = agent
        .get(&url)
        .call()
        .with_context(|| format!("GET {url}"))?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("GET {url} failed: HTTP {}", status.as_u16()));
    }
    let body = response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("read body of {url}"))?;

    fs::create_dir_all(cache_dir).with_context(|| format!("create {}", cache_dir.display()))?;
    let out = cache_path(cache_dir, group);
    fs::write(&out, body.as_bytes()).with_context(|| format!("write {}", out.display()))?;
    tracing::info!(url = %url, bytes = body.len(), "fetched element set");
    Ok((out, body.len()))
}
