use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, StatusCode};
use tsinfo_core::FrameConfig;

use crate::error::ScraperError;
use crate::extract::FrameSnapshot;
use crate::rate_limit::retry_with_backoff;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// HTTP client that downloads the markup of each attendance frame.
///
/// The attendance page only renders for a logged-in user, so the browser's
/// session cookie is forwarded verbatim when configured. Transient failures
/// (429, timeouts, 5xx) are retried with jittered exponential back-off.
pub struct FrameClient {
    client: Client,
    session_cookie: Option<String>,
    /// Additional attempts after the first failure.
    max_retries: u32,
    /// Base delay for back-off: `backoff_base_ms * 2^(n-1)` before the n-th retry.
    backoff_base_ms: u64,
}

impl FrameClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        session_cookie: Option<String>,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            session_cookie,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Downloads one frame and wraps its body as a snapshot.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] on HTTP 429 after all retries.
    /// - [`ScraperError::NotFound`] on HTTP 404 (not retried).
    /// - [`ScraperError::Unauthorized`] on HTTP 401/403 (not retried).
    /// - [`ScraperError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`ScraperError::Http`] for network or TLS failures after all retries.
    pub async fn fetch_frame(&self, frame: &FrameConfig) -> Result<FrameSnapshot, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let mut request = self.client.get(&frame.url).header(ACCEPT, HTML_ACCEPT);
            if let Some(cookie) = &self.session_cookie {
                request = request.header(COOKIE, cookie.as_str());
            }

            let response = request.send().await?;
            let status = response.status();
            let url = frame.url.clone();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScraperError::RateLimited {
                    url,
                    retry_after_secs,
                });
            }
            if status == StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound { url });
            }
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ScraperError::Unauthorized {
                    status: status.as_u16(),
                    url,
                });
            }
            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url,
                });
            }

            let html = response.text().await?;
            tracing::debug!(frame = %frame.id, bytes = html.len(), "frame downloaded");
            Ok(FrameSnapshot::new(frame.id.clone(), html))
        })
        .await
    }
}
