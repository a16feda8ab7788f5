//! Scene source resolution.
//!
//! Local paths are used in place. Remote URLs are downloaded into the job's
//! scratch directory, but only from allow-listed hosts and only within the
//! configured fetch timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reelsmith_common::{PipelineConfig, ReelError, ReelResult};
use reelsmith_project_model::scene::SourceRef;
use reqwest::redirect;
use tokio::io::AsyncWriteExt;

const MAX_REDIRECTS: usize = 10;

/// Resolves scene sources to local files.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: reqwest::Client,
    allowed_hosts: Vec<String>,
    timeout: Duration,
    max_bytes: u64,
}

impl AssetFetcher {
    pub fn new(allowed_hosts: Vec<String>, timeout: Duration) -> ReelResult<Self> {
        let allowed_hosts: Vec<String> = allowed_hosts
            .into_iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        let hop_hosts = allowed_hosts.clone();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("reelsmith/", env!("CARGO_PKG_VERSION")))
            .redirect(redirect::Policy::custom(move |attempt| {
                redirect_action(attempt, &hop_hosts)
            }))
            .build()
            .map_err(|e| ReelError::fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            allowed_hosts,
            timeout,
            max_bytes: PipelineConfig::default().max_asset_bytes,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> ReelResult<Self> {
        Ok(Self::new(
            config.allowed_hosts.clone(),
            Duration::from_secs(config.fetch_timeout_secs.max(1)),
        )?
        .with_max_bytes(config.max_asset_bytes))
    }

    /// Cap on the size of a single download.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes.max(1);
        self
    }

    /// Local file for `source`. Downloads land in `dest_dir` named `stem`
    /// plus the URL's extension.
    pub async fn resolve(&self, source: &SourceRef, dest_dir: &Path, stem: &str) -> ReelResult<PathBuf> {
        match source {
            SourceRef::Path(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(ReelError::FileNotFound { path: path.clone() })
                }
            }
            SourceRef::Url(url) => self.download(url, dest_dir, stem).await,
            SourceRef::Generated => Err(ReelError::fetch("generated scenes have no source to fetch")),
        }
    }

    /// Check a URL against the scheme and host allow-list.
    pub fn check_url(&self, url: &str) -> ReelResult<reqwest::Url> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ReelError::fetch(format!("invalid URL {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ReelError::fetch(format!(
                "unsupported scheme {:?} in {url}",
                parsed.scheme()
            )));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| ReelError::fetch(format!("URL has no host: {url}")))?;
        if !host_allowed(host, &self.allowed_hosts) {
            return Err(ReelError::fetch(format!("host not allowed: {host}")));
        }
        Ok(parsed)
    }

    async fn download(&self, url: &str, dest_dir: &Path, stem: &str) -> ReelResult<PathBuf> {
        let parsed = self.check_url(url)?;
        let dest = dest_dir.join(format!("{stem}.{}", url_extension(&parsed)));

        tracing::debug!(url, dest = %dest.display(), "Fetching asset");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.transfer_error(url, "request", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReelError::fetch(format!("{url} returned HTTP {status}")));
        }
        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(ReelError::fetch(format!(
                    "{url} is {length} bytes, over the {} byte limit",
                    self.max_bytes
                )));
            }
        }

        match self.write_body(url, response, &dest).await {
            Ok(bytes) => {
                tracing::debug!(url, bytes, "Fetched asset");
                Ok(dest)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&dest).await;
                Err(e)
            }
        }
    }

    async fn write_body(&self, url: &str, mut response: reqwest::Response, dest: &Path) -> ReelResult<u64> {
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transfer_error(url, "reading", e))?
        {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(ReelError::fetch(format!(
                    "{url} exceeded the {} byte limit",
                    self.max_bytes
                )));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if written == 0 {
            return Err(ReelError::fetch(format!("{url} returned an empty body")));
        }
        Ok(written)
    }

    fn transfer_error(&self, url: &str, doing: &str, e: reqwest::Error) -> ReelError {
        if e.is_timeout() {
            ReelError::timeout(format!("fetch {url}"), self.timeout.as_secs_f64())
        } else if e.is_redirect() {
            let reason = std::error::Error::source(&e)
                .map(ToString::to_string)
                .unwrap_or_else(|| e.to_string());
            ReelError::fetch(format!("redirect from {url} refused: {reason}"))
        } else {
            ReelError::fetch(format!("{doing} {url} failed: {e}"))
        }
    }
}

/// Every redirect hop must pass the same scheme and host checks as the
/// first request.
fn redirect_action(attempt: redirect::Attempt<'_>, allowed: &[String]) -> redirect::Action {
    if attempt.previous().len() >= MAX_REDIRECTS {
        return attempt.error("too many redirects");
    }
    let target = attempt.url();
    let refusal = match target.host_str() {
        _ if !matches!(target.scheme(), "http" | "https") => {
            Some(format!("redirect to unsupported scheme {}", target.scheme()))
        }
        Some(host) if host_allowed(host, allowed) => None,
        Some(host) => Some(format!("redirect to unlisted host {host}")),
        None => Some("redirect target has no host".to_string()),
    };
    match refusal {
        Some(reason) => attempt.error(reason),
        None => attempt.follow(),
    }
}

/// Host matches an entry exactly, or a `.domain` entry matches the domain
/// and any of its subdomains.
pub fn host_allowed(host: &str, allowed: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    allowed.iter().any(|entry| {
        let entry = entry.to_ascii_lowercase();
        match entry.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(&entry),
            None => host == entry,
        }
    })
}

fn url_extension(url: &reqwest::Url) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}
