//! Where metadata documents come from.
//!
//! This module defines a trait for fetching a metadata document as text.
//! Based on the enabled features an HTTP implementation is exported next to
//! the file one. Fetch failures are passed through to the caller as they are;
//! nothing here retries.
use async_trait::async_trait;
use thiserror::Error;

/// Possible errors while fetching a document.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a local file failed.
    #[error("Could not read {0}: {1}")]
    Io(String, #[source] std::io::Error),
    /// The HTTP request failed or returned a non-success status.
    #[error("Could not fetch {0}: {1}")]
    Http(String, #[source] Box<dyn std::error::Error + Send + Sync>),
    /// The location needs a feature that isn't compiled in.
    #[error("Unsupported metadata location {0}")]
    Unsupported(String),
}

/// Result of a fetch.
pub type Result<T> = std::result::Result<T, Error>;

#[async_trait]
pub trait Source {
    /// Fetch the whole document at `location`.
    async fn fetch(&self, location: &str) -> Result<String>;
}

/// Reads metadata from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

#[async_trait]
impl Source for FileSource {
    #[tracing::instrument(level = "info", skip(self))]
    async fn fetch(&self, location: &str) -> Result<String> {
        tokio::fs::read_to_string(location)
            .await
            .map_err(|e| Error::Io(location.to_owned(), e))
    }
}

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpSource;

/// Fetches `http://` and `https://` locations over HTTP and everything else
/// from the filesystem.
#[derive(Debug, Default, Clone)]
pub struct AnySource {
    #[cfg(feature = "http")]
    http: HttpSource,
    file: FileSource,
}

fn is_http(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait]
impl Source for AnySource {
    async fn fetch(&self, location: &str) -> Result<String> {
        if is_http(location) {
            #[cfg(feature = "http")]
            return self.http.fetch(location).await;
            #[cfg(not(feature = "http"))]
            return Err(Error::Unsupported(location.to_owned()));
        }
        self.file.fetch(location).await
    }
}
