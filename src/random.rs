use std::time::Duration;

use tracing::{error, info};

use crate::error::Error;

/// random.org decimal-fractions endpoint: one value, two decimal places,
/// plain-text body.
const RANDOM_ORG_URL: &str =
    "https://www.random.org/decimal-fractions/?num=1&dec=2&col=1&format=plain&rnd=new";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One random draw in [0, 1). The arena takes this as a seam so tests can
/// force the draw.
#[allow(async_fn_in_trait)]
pub trait RandomSource {
    async fn fetch_random(&self) -> Result<f64, Error>;
}

/// HTTPS client for random.org. No retries; failures surface to the caller
/// of `battle()` immediately.
pub struct RandomOrgClient {
    http: reqwest::Client,
    url: String,
}

impl RandomOrgClient {
    pub fn new() -> Self {
        Self::with_endpoint(RANDOM_ORG_URL, REQUEST_TIMEOUT)
    }

    /// Point the client somewhere else. Tests aim this at a local listener.
    pub fn with_endpoint(url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction");
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn fetch_random(&self) -> Result<f64, Error> {
        info!("Fetching random number from {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(map_transport_error)?;
        let body = response.text().await.map_err(map_transport_error)?;

        let value = parse_random_body(&body)?;
        info!("Received random number: {value:.3}");
        Ok(value)
    }
}

impl Default for RandomOrgClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for RandomOrgClient {
    async fn fetch_random(&self) -> Result<f64, Error> {
        RandomOrgClient::fetch_random(self).await
    }
}

fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        error!("Request to random.org timed out.");
        Error::RandomTimeout
    } else {
        error!("Request to random.org failed: {e}");
        Error::RandomRequest(e)
    }
}

fn parse_random_body(body: &str) -> Result<f64, Error> {
    let trimmed = body.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::InvalidRandomResponse(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve one HTTP response with the given body on an ephemeral port.
    async fn serve_once(body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = sock.write_all(resp.as_bytes()).await;
        });
        format!("http://{addr}/")
    }

    #[test]
    fn parses_a_trimmed_decimal_body() {
        assert_eq!(parse_random_body("0.1\n").unwrap(), 0.1);
        assert_eq!(parse_random_body("  0.57  ").unwrap(), 0.57);
    }

    #[test]
    fn rejects_a_non_numeric_body_carrying_the_text() {
        let err = parse_random_body("invalid_response\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response from random.org: invalid_response"
        );
    }

    #[tokio::test]
    async fn fetches_and_parses_a_plain_text_draw() {
        let url = serve_once("0.57\n").await;
        let client = RandomOrgClient::with_endpoint(url, Duration::from_secs(2));
        assert_eq!(client.fetch_random().await.unwrap(), 0.57);
    }

    #[tokio::test]
    async fn invalid_body_surfaces_through_fetch() {
        let url = serve_once("invalid_response").await;
        let client = RandomOrgClient::with_endpoint(url, Duration::from_secs(2));
        let err = client.fetch_random().await.unwrap_err();
        assert!(matches!(err, Error::InvalidRandomResponse(ref s) if s == "invalid_response"));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        // Accepted at the OS level but never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let client = RandomOrgClient::with_endpoint(url, Duration::from_millis(200));
        let err = client.fetch_random().await.unwrap_err();
        assert!(matches!(err, Error::RandomTimeout));
        assert_eq!(err.to_string(), "Request to random.org timed out.");
        drop(listener);
    }

    #[tokio::test]
    async fn refused_connection_is_a_request_failure() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            RandomOrgClient::with_endpoint(format!("http://{addr}/"), Duration::from_secs(2));
        let err = client.fetch_random().await.unwrap_err();
        assert!(matches!(err, Error::RandomRequest(_)));
        assert!(err.to_string().starts_with("Request to random.org failed:"));
    }
}
