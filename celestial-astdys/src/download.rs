//! Fetching raw catalogs.
//!
//! The store only needs "put the bytes at this URL into this file". That
//! seam is the [`Fetcher`] trait so tests and offline setups can swap the
//! HTTP implementation for something local.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Limit on establishing the connection. Reading the body has no deadline
/// unless [`HttpFetcher::with_timeout`] sets one.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn default_user_agent() -> String {
    format!("celestial-astdys/{}", env!("CARGO_PKG_VERSION"))
}

/// Retrieves a remote file onto local disk.
pub trait Fetcher: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// Must not leave a partial `dest` behind on failure.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Blocking HTTP GET via `reqwest`, streamed to disk.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    connect_timeout: Duration,
    timeout: Option<Duration>,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            connect_timeout,
            timeout: None,
            user_agent: user_agent.into(),
        }
    }

    /// Abort the whole request, body included, after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn client(&self) -> std::result::Result<Client, reqwest::Error> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, default_user_agent())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let client = self
            .client()
            .map_err(|e| Error::download(url, dest, format!("failed to create HTTP client: {}", e)))?;

        log::info!("downloading {}", url);
        let mut response = client
            .get(url)
            .send()
            .map_err(|e| Error::download(url, dest, e))?;

        if !response.status().is_success() {
            return Err(Error::download(
                url,
                dest,
                format!("HTTP error {}", response.status()),
            ));
        }

        let tmp_path = dest.with_extension("part");
        let written = File::create(&tmp_path)
            .map_err(|e| Error::download(url, dest, e))
            .and_then(|mut file| {
                let n = response
                    .copy_to(&mut file)
                    .map_err(|e| Error::download(url, dest, format!("failed to read response: {}", e)))?;
                file.flush().map_err(|e| Error::download(url, dest, e))?;
                Ok(n)
            })
            .and_then(|n| {
                fs::rename(&tmp_path, dest).map_err(|e| Error::download(url, dest, e))?;
                Ok(n)
            });
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        let written = written?;

        log::info!("saved {} ({} bytes)", dest.display(), written);
        Ok(written)
    }
}
