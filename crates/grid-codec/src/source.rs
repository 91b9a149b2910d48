//! Byte sources for grids, colormaps and pre-rendered images.
//!
//! Everything the explorer reads after the manifest is addressed by a URL
//! relative to the scene folder (`data/sst_3.gz`, `cmaps/viridis.json`,
//! `images/rgb_3.png`). A [`DataSource`] resolves such a URL to bytes,
//! either over HTTP or from a local folder.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{decode_grid, CodecError, DecodedGrid, Result};

/// Resolves a relative URL to its bytes.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the full body behind `url`.
    ///
    /// Any transport failure is reported as [`CodecError::Fetch`].
    async fn fetch(&self, url: &str) -> Result<Bytes>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Fetch and decode one raw grid.
#[instrument(skip(source), fields(source = %source.describe()))]
pub async fn fetch_grid(source: &dyn DataSource, url: &str) -> Result<DecodedGrid> {
    let compressed = source.fetch(url).await?;
    let owned_url = url.to_string();
    tokio::task::spawn_blocking(move || decode_grid(&compressed, &owned_url))
        .await
        .map_err(|e| CodecError::fetch(url, format!("decode task failed: {}", e)))?
}

/// HTTP source rooted at a base URL.
pub struct HttpSource {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpSource {
    /// Create a source for `base_url`; relative URLs are joined onto it.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = reqwest::Url::parse(base_url)
            .map_err(|e| CodecError::fetch(base_url, format!("invalid base URL: {}", e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| CodecError::fetch(base_url, format!("failed to build client: {}", e)))?;

        Ok(Self { client, base })
    }

    /// Absolute URL for a relative reference.
    pub fn resolve(&self, url: &str) -> Result<reqwest::Url> {
        self.base
            .join(url)
            .map_err(|e| CodecError::fetch(url, format!("invalid URL: {}", e)))
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let target = self.resolve(url)?;
        debug!(url = %target, "Fetching");

        let response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(|e| CodecError::fetch(target.as_str(), e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| CodecError::fetch(target.as_str(), e.to_string()))?;

        response
            .bytes()
            .await
            .map_err(|e| CodecError::fetch(target.as_str(), e.to_string()))
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

/// Filesystem source rooted at a scene folder.
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a relative URL to a path under the root.
    ///
    /// Absolute paths and `..` components are rejected so a reference can
    /// never leave the scene folder.
    pub fn resolve(&self, url: &str) -> Result<PathBuf> {
        let relative = Path::new(url.split(&['?', '#'][..]).next().unwrap_or(url));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || url.is_empty() {
            return Err(CodecError::fetch(url, "path escapes the scene folder"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DataSource for FsSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let path = self.resolve(url)?;
        debug!(path = %path.display(), "Reading");
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| CodecError::fetch(url, e.to_string()))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_resolve_rejects_escape() {
        let src = FsSource::new("/srv/scenes");
        assert!(src.resolve("../etc/passwd").is_err());
        assert!(src.resolve("/etc/passwd").is_err());
        assert!(src.resolve("data/../../x").is_err());
        assert!(src.resolve("").is_err());
        assert_eq!(
            src.resolve("data/sst_0.gz").unwrap(),
            PathBuf::from("/srv/scenes/data/sst_0.gz")
        );
    }

    #[test]
    fn test_fs_resolve_strips_query() {
        let src = FsSource::new("/srv");
        assert_eq!(
            src.resolve("images/a.png?v=2").unwrap(),
            PathBuf::from("/srv/images/a.png")
        );
    }

    #[test]
    fn test_http_resolve_joins_relative() {
        let src = HttpSource::new("http://localhost:9009/run1", Duration::from_secs(5)).unwrap();
        assert_eq!(
            src.resolve("data/sst_0.gz").unwrap().as_str(),
            "http://localhost:9009/run1/data/sst_0.gz"
        );
    }

    #[tokio::test]
    async fn test_fs_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = FsSource::new(dir.path());
        let err = src.fetch("data/none.gz").await.unwrap_err();
        assert!(err.is_fetch());
    }
}
