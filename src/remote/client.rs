//! Typed resource client
//!
//! Stateless: it holds a transport and a retry policy, nothing else. Reads
//! (GET) are retried on transport failures and 5xx responses; writes never
//! are, since the server may already have applied them.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::keys::QueryFilter;
use crate::model::Page;
use crate::remote::envelope::{self, error_from};
use crate::remote::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
use crate::remote::{
    ApplicationsApi, DashboardApi, ExportsApi, JobsApi, NotificationsApi, SavedJobsApi,
};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry behaviour for idempotent reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further attempt
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Backoff before retry number `attempt` (1-based), with up to 25% jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self
            .retry_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        let jitter_ms = (base.as_millis() as u64) / 4;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Client for the recruitment REST API
#[derive(Clone)]
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ResourceClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
        }
    }

    /// Client over HTTP, configured from `config`
    pub fn http(config: ClientConfig) -> Result<Self> {
        let retry = RetryPolicy::from_config(&config);
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport)).with_retry(retry))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn jobs(&self) -> JobsApi {
        JobsApi::new(self.clone())
    }

    pub fn applications(&self) -> ApplicationsApi {
        ApplicationsApi::new(self.clone())
    }

    pub fn saved_jobs(&self) -> SavedJobsApi {
        SavedJobsApi::new(self.clone())
    }

    pub fn notifications(&self) -> NotificationsApi {
        NotificationsApi::new(self.clone())
    }

    pub fn dashboard(&self) -> DashboardApi {
        DashboardApi::new(self.clone())
    }

    pub fn exports(&self) -> ExportsApi {
        ExportsApi::new(self.clone())
    }

    /// Send a request, retrying reads on retryable failures
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let max_retries = if request.method.is_read() {
            self.retry.max_retries
        } else {
            0
        };
        let mut attempt = 0;

        loop {
            let outcome = self.transport.send(request.clone()).await;

            let failure = match outcome {
                Ok(response) if response.is_server_error() => error_from(&response),
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            if attempt >= max_retries {
                return Err(failure);
            }

            attempt += 1;
            let delay = self.retry.delay_for(attempt);
            warn!(
                "{} {} failed (attempt {}/{}), retrying after {:?}: {}",
                request.method.as_str(),
                request.path,
                attempt,
                max_retries,
                delay,
                failure
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// GET and decode the envelope's `data`
    pub async fn get<T, F>(&self, path: &str, filter: Option<&F>) -> Result<T>
    where
        T: DeserializeOwned,
        F: QueryFilter + ?Sized,
    {
        let response = self.execute(read_request(path, filter)).await?;
        envelope::decode_data(&response)
    }

    /// GET a paginated listing
    pub async fn get_page<T, F>(&self, path: &str, filter: Option<&F>) -> Result<Page<T>>
    where
        T: DeserializeOwned,
        F: QueryFilter + ?Sized,
    {
        let response = self.execute(read_request(path, filter)).await?;
        envelope::decode_page(&response)
    }

    /// GET raw bytes (exports, files), outside the JSON envelope
    pub async fn get_bytes<F>(&self, path: &str, filter: Option<&F>) -> Result<Vec<u8>>
    where
        F: QueryFilter + ?Sized,
    {
        let response = self.execute(read_request(path, filter)).await?;
        if !response.is_success() {
            return Err(error_from(&response));
        }
        debug!("Downloaded {} bytes from {}", response.body.len(), path);
        Ok(response.body)
    }

    /// Write with an optional JSON body and decode the returned entity
    pub async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(write_request(method, path, body)?).await?;
        envelope::decode_data(&response)
    }

    /// Write whose response carries nothing but success
    pub async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.execute(write_request(method, path, body)?).await?;
        envelope::expect_success(&response)
    }
}

/// Filter type for calls that take none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFilter;

impl QueryFilter for NoFilter {
    fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        Vec::new()
    }
}

/// No filter, typed for [`ResourceClient::get`] and friends
pub const NO_FILTER: Option<&NoFilter> = None;

/// Empty request body
pub const NO_BODY: Option<&serde_json::Value> = None;

fn read_request<F: QueryFilter + ?Sized>(path: &str, filter: Option<&F>) -> ApiRequest {
    let query = filter
        .map(|f| f.normalized().to_query_pairs())
        .unwrap_or_default();
    ApiRequest::get(path).query(query)
}

fn write_request<B: Serialize + ?Sized>(
    method: Method,
    path: &str,
    body: Option<&B>,
) -> Result<ApiRequest> {
    let request = ApiRequest::new(method, path);
    match body {
        Some(body) => request.json(body),
        None => Ok(request),
    }
}

/// Validate an id before placing it in a URL path
pub(crate) fn path_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '?', '#']) {
        return Err(ClientError::validation(format!("invalid resource id `{}`", id)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Flaky {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
        failure: ApiResponse,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Flaky {
        fn new(failures: usize, failure: ApiResponse) -> Arc<Self> {
            Arc::new(Self {
                failures_left: AtomicUsize::new(failures),
                calls: AtomicUsize::new(0),
                failure,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Flaky {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Ok(self.failure.clone());
            }
            Ok(ApiResponse::json(200, &json!({"success": true, "data": {"count": 1}})))
        }
    }

    fn quick_retries(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_reads_retry_on_server_error() {
        let transport = Flaky::new(2, ApiResponse::new(503, Vec::new()));
        let client = ResourceClient::new(transport.clone()).with_retry(quick_retries(2));

        let count: crate::model::UnreadCount = client
            .get("/notifications/unread-count", NO_FILTER)
            .await
            .unwrap();
        assert_eq!(count.count, 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reads_give_up_after_max_retries() {
        let transport = Flaky::new(5, ApiResponse::new(500, b"boom".to_vec()));
        let client = ResourceClient::new(transport.clone()).with_retry(quick_retries(1));

        let err = client
            .get::<crate::model::UnreadCount, NoFilter>("/x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 500, .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_writes_never_retry() {
        let transport = Flaky::new(1, ApiResponse::new(503, Vec::new()));
        let client = ResourceClient::new(transport.clone()).with_retry(quick_retries(3));

        let result = client
            .send_unit(Method::Patch, "/notifications/read-all", NO_BODY)
            .await;
        assert!(result.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let transport = Flaky::new(1, ApiResponse::json(404, &json!({"success": false})));
        let client = ResourceClient::new(transport.clone()).with_retry(quick_retries(3));

        let err = client
            .get::<crate::model::UnreadCount, NoFilter>("/jobs/J404", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_filter_becomes_query_string() {
        let transport = Flaky::new(0, ApiResponse::new(500, Vec::new()));
        let client = ResourceClient::new(transport.clone());
        let filter = crate::model::NotificationFilter::default().unread_only().page(2);

        let _: crate::model::UnreadCount = client.get("/notifications", Some(&filter)).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(
            seen[0].query,
            vec![
                ("isRead".to_string(), "false".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_delay_grows_with_attempts() {
        let policy = RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
        };
        let first = policy.delay_for(1);
        let third = policy.delay_for(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(500));
    }

    #[test]
    fn test_path_id() {
        assert_eq!(path_id(" A1 ").unwrap(), "A1");
        assert!(path_id("").is_err());
        assert!(path_id("a/b").is_err());
    }
}
