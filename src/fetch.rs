//! Retrieval of the source document bytes.
//!
//! The signing dialog only sees the [`DocumentSource`] boundary; the HTTP
//! implementation lives here so tests can substitute an in-memory source.

use crate::Error;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the raw document bytes. Any failure aborts composition.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Error>;
}

/// HTTP GET against a caller-supplied document URL.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpSource { client }
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
