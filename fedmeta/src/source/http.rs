use std::time::Duration;

use async_trait::async_trait;

use super::{Error, Result, Source};

/// How long a metadata request may take before it is abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches metadata over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Use an already configured client, e.g. one with a proxy.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Give up on requests that take longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with a timeout, using the default: {}", e);
                reqwest::Client::new()
            });
        Self { client }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Source for HttpSource {
    #[tracing::instrument(level = "info", skip(self))]
    async fn fetch(&self, location: &str) -> Result<String> {
        let to_error = |e: reqwest::Error| Error::Http(location.to_owned(), Box::new(e));
        let response = self
            .client
            .get(location)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(to_error)?;
        tracing::debug!("Metadata responded with {}", response.status());
        response.text().await.map_err(to_error)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    #[tokio::test]
    async fn test_fetches_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/metadata");
                then.status(200)
                    .header("Content-Type", "application/samlmetadata+xml")
                    .body("<md:EntitiesDescriptor/>");
            })
            .await;

        let body = HttpSource::default()
            .fetch(&server.url("/metadata"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, "<md:EntitiesDescriptor/>");
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/metadata");
                then.status(503);
            })
            .await;

        let location = server.url("/metadata");
        let err = HttpSource::default().fetch(&location).await.unwrap_err();
        assert!(matches!(err, Error::Http(ref l, _) if *l == location));
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/metadata");
                then.status(200)
                    .body("<md:EntitiesDescriptor/>")
                    .delay(Duration::from_secs(5));
            })
            .await;

        let started = std::time::Instant::now();
        let err = HttpSource::with_timeout(Duration::from_millis(200))
            .fetch(&server.url("/metadata"))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            Error::Http(_, source) => {
                let source = source.downcast::<reqwest::Error>().unwrap();
                assert!(source.is_timeout());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
