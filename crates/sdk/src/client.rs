//! d2render Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{HealthResponse, RenderRequest};
use reqwest::{Client, Url};
use std::time::Duration;

/// Default request timeout; renders can take a while for large diagrams
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// d2render Service Client
///
/// # Example
///
/// ```no_run
/// use d2render_sdk::RenderClient;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RenderClient::connect("http://127.0.0.1:8080")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RenderClient {
    client: Client,
    base_url: Url,
}

impl RenderClient {
    /// Create a client for the service at `url`
    ///
    /// No request is made; connection errors surface on the first call.
    pub fn connect(url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let url = url.as_ref();
        let base_url =
            Url::parse(url).map_err(|e| SdkError::InvalidUrl(format!("{}: {}", url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(SdkError::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SdkError::InvalidUrl(e.to_string()))
    }

    /// Render a diagram, returning the SVG bytes
    ///
    /// # Errors
    /// - SdkError::Http with status 400 for malformed options
    /// - SdkError::Http with status 500 carrying the tool's stderr
    pub async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint("render")?)
            .json(request)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Query service health
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(self.endpoint("health")?).send().await?;
        let response = check_status(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Turn non-2xx responses into SdkError::Http with the body as message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default().trim().to_string();
    Err(SdkError::Http {
        status: status.as_u16(),
        message,
    })
}
