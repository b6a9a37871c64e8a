use std::sync::Arc;
use std::time::Duration;

use crawl_logging::{crawl_debug, crawl_warn};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;

use crate::decode::decode_text;
use crate::state::CrawlState;
use crate::types::{FailureKind, FetchError, JobId, PageContent};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Upper bound on each individual attempt, not on the whole call.
    pub attempt_timeout: Duration,
    /// How many attempts a URL gets before it is blacklisted.
    pub max_attempts: usize,
    /// Optional cap on simultaneously running fetches. `None` leaves the
    /// fan-out unbounded.
    pub max_concurrency: Option<usize>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(15),
            max_attempts: 5,
            max_concurrency: None,
        }
    }
}

/// Raw transport response: declared content type plus the body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// The single "get bytes for a URL" capability the fetcher retries over.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError>;
}

/// HTTPS transport over reqwest with the platform's default trust roots.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(attempt_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(attempt_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Other, err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = response
            .bytes()
            .await
            .map_err(map_reqwest_error)?
            .to_vec();

        Ok(RawResponse { content_type, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_connect() {
        return FetchError::new(FailureKind::Connect, err.to_string());
    }
    if err.is_body() {
        return FetchError::new(FailureKind::Disconnected, err.to_string());
    }
    let message = err.to_string();
    // hyper reports a peer hanging up mid-exchange as a generic request
    // error; match on the message the way retry classifiers usually do.
    if message.contains("connection closed")
        || message.contains("connection reset")
        || message.contains("IncompleteMessage")
    {
        return FetchError::new(FailureKind::Disconnected, message);
    }
    FetchError::new(FailureKind::Other, message)
}

/// Issues "get content for a URL" calls with bounded retries and
/// permanent-failure memory. Owns all mutations of the shared crawl
/// state; callers only read it.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    state: Arc<CrawlState>,
    settings: FetchSettings,
    limiter: Option<Arc<Semaphore>>,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        state: Arc<CrawlState>,
        settings: FetchSettings,
    ) -> Self {
        let limiter = settings
            .max_concurrency
            .map(|permits| Arc::new(Semaphore::new(permits)));
        Self {
            transport,
            state,
            settings,
            limiter,
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches `url`, retrying transient failures up to the attempt cap.
    ///
    /// `Ok(Some(content))` marks the URL downloaded and, when `job` is
    /// given, attributes the download to that job's counter.
    /// `Ok(None)` means every attempt failed: the URL is now blacklisted
    /// and its last error recorded, so callers may skip it silently.
    /// Unclassified errors propagate as `Err` without consuming retries.
    pub async fn fetch(
        &self,
        url: &str,
        job: Option<JobId>,
    ) -> Result<Option<PageContent>, FetchError> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|err| FetchError::new(FailureKind::Cancelled, err.to_string()))?,
            ),
            None => None,
        };

        let max_attempts = self.settings.max_attempts;
        let mut last_error = String::from("no attempt made");
        for attempt in 1..=max_attempts {
            let outcome =
                tokio::time::timeout(self.settings.attempt_timeout, self.transport.get(url)).await;
            let error = match outcome {
                Err(_) => FetchError::new(
                    FailureKind::Timeout,
                    format!("no response within {:?}", self.settings.attempt_timeout),
                ),
                Ok(Err(err)) => err,
                Ok(Ok(raw)) => match into_content(raw) {
                    Ok(content) => {
                        self.state.mark_downloaded(url, job);
                        crawl_debug!("fetched {url} on attempt {attempt}");
                        return Ok(Some(content));
                    }
                    Err(err) => err,
                },
            };
            if !error.kind.is_retryable() {
                return Err(error);
            }
            crawl_warn!("attempt {attempt}/{max_attempts} for {url} failed: {error}");
            last_error = error.to_string();
        }

        self.state.mark_failed(url, &last_error);
        Ok(None)
    }
}

fn into_content(raw: RawResponse) -> Result<PageContent, FetchError> {
    let is_text = raw
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("text/html"));
    if is_text {
        let text = decode_text(&raw.body, raw.content_type.as_deref())?;
        Ok(PageContent::Text(text))
    } else {
        Ok(PageContent::Bytes(raw.body))
    }
}
