//! HTTP transport over reqwest.

use super::{ShareTransport, TransportError, TransportResponse};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Transport that talks to a share service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url`.
    ///
    /// Request paths are resolved relative to the base, so a service mounted
    /// under a sub-path (`https://host/api/`) works.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidRequest(format!("base url {:?}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Base URL requests are resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidRequest(format!("path {:?}: {}", path, e)))
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::ConnectionFailed(e.to_string())
    }
}

async fn into_response(response: reqwest::Response) -> Result<TransportResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(map_error)?;
    Ok(TransportResponse { status, body })
}

#[async_trait]
impl ShareTransport for HttpTransport {
    async fn post_form(
        &self,
        path: &str,
        field: &str,
        value: &str,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path)?;
        tracing::debug!(%url, bytes = value.len(), "POST form");

        let response = self
            .client
            .post(url)
            .form(&[(field, value)])
            .send()
            .await
            .map_err(map_error)?;
        into_response(response).await
    }

    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "GET");

        let response = self.client.get(url).send().await.map_err(map_error)?;
        into_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_against_base() {
        let transport = HttpTransport::new("http://127.0.0.1:8080", Duration::from_secs(5)).unwrap();
        assert_eq!(
            transport.url("/share").unwrap().as_str(),
            "http://127.0.0.1:8080/share"
        );

        let nested = HttpTransport::new("https://host.example/api", Duration::from_secs(5)).unwrap();
        assert_eq!(
            nested.url("/share/ab12").unwrap().as_str(),
            "https://host.example/api/share/ab12"
        );
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(matches!(
            HttpTransport::new("not a url", Duration::from_secs(1)),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_connection_failure() {
        // Port 9 (discard) on loopback is almost never listening.
        let transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = transport.get("/share/ab12").await;
        assert!(matches!(
            result,
            Err(TransportError::ConnectionFailed(_)) | Err(TransportError::Timeout)
        ));
    }
}
