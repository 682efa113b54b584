//! HTTP client for the SSR sidecar.

use std::time::Duration;

use async_trait::async_trait;
use inertia_core::{Page, SsrConfig, DEFAULT_SSR_URL};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::error::SsrError;
use crate::response::SsrResponse;
use crate::timeout::SsrTimeouts;

/// Path the sidecar serves render requests on.
pub const RENDER_PATH: &str = "/render";

/// Renders a page's markup outside this process.
///
/// `budget` is the time the caller can still afford; implementations must not
/// take longer than that.
#[async_trait]
pub trait SsrRenderer: Send + Sync {
    /// Render one page.
    async fn render(&self, page: &Page, budget: Option<Duration>)
        -> Result<SsrResponse, SsrError>;
}

/// Sidecar client posting the page as JSON to `<base>/render`.
#[derive(Debug, Clone)]
pub struct HttpSsrRenderer {
    client: Client,
    endpoint: Url,
    timeouts: SsrTimeouts,
}

impl HttpSsrRenderer {
    /// Create a client for the sidecar at `url` with default timeouts.
    pub fn new(url: &str) -> Result<Self, SsrError> {
        Self::with_timeouts(url, SsrTimeouts::default())
    }

    /// Create a client for the sidecar on its default address.
    pub fn with_default_url() -> Result<Self, SsrError> {
        Self::new(DEFAULT_SSR_URL)
    }

    /// Create a client from an SSR configuration.
    pub fn from_config(config: &SsrConfig) -> Result<Self, SsrError> {
        Self::with_timeouts(&config.url, SsrTimeouts::from_config(config))
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(url: &str, timeouts: SsrTimeouts) -> Result<Self, SsrError> {
        let endpoint = render_endpoint(url);
        let endpoint =
            Url::parse(&endpoint).map_err(|e| SsrError::InvalidUrl(format!("{endpoint}: {e}")))?;

        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| SsrError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            timeouts,
        })
    }

    /// The full URL render requests are posted to.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// The configured time limits.
    pub fn timeouts(&self) -> SsrTimeouts {
        self.timeouts
    }
}

#[async_trait]
impl SsrRenderer for HttpSsrRenderer {
    #[tracing::instrument(
        name = "ssr_render",
        skip(self, page),
        fields(component = %page.component, endpoint = %self.endpoint)
    )]
    async fn render(
        &self,
        page: &Page,
        budget: Option<Duration>,
    ) -> Result<SsrResponse, SsrError> {
        let timeout = self.timeouts.effective(budget);
        if timeout.is_zero() {
            warn!("deadline already passed, skipping SSR call");
            return Err(SsrError::Timeout(timeout));
        }

        let body = serde_json::to_vec(page).map_err(SsrError::Encode)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            warn!(status = status.as_u16(), "SSR sidecar returned an error status");
            return Err(SsrError::BadStatus {
                status: status.as_u16(),
            });
        }

        let reply: SsrResponse = response.json().await.map_err(|e| classify(e, timeout))?;
        debug!(head = reply.head.len(), body_len = reply.body.len(), "SSR render complete");

        Ok(reply)
    }
}

/// Build the render URL, accepting a base that already ends in `/render`.
pub fn render_endpoint(url: &str) -> String {
    let base = url.trim_end_matches('/');
    let base = base.strip_suffix(RENDER_PATH).unwrap_or(base);
    format!("{}{}", base.trim_end_matches('/'), RENDER_PATH)
}

fn classify(err: reqwest::Error, timeout: Duration) -> SsrError {
    if err.is_timeout() {
        SsrError::Timeout(timeout)
    } else if err.is_decode() {
        SsrError::Decode(err.to_string())
    } else {
        SsrError::Connection(err.to_string())
    }
}
