//! Remote resource client
//!
//! Typed, stateless wrappers over the REST API. Each resource family gets an
//! API struct ([`JobsApi`], [`ApplicationsApi`], ...) handed out by
//! [`ResourceClient`]; none of them touch the cache.

pub mod applications;
pub mod client;
pub mod dashboard;
pub mod envelope;
pub mod exports;
pub mod jobs;
pub mod notifications;
pub mod saved_jobs;
pub mod transport;

pub use applications::ApplicationsApi;
pub use client::{NoFilter, ResourceClient, RetryPolicy, NO_BODY, NO_FILTER};
pub use dashboard::DashboardApi;
pub use envelope::{Envelope, FieldError, FieldErrors};
pub use exports::ExportsApi;
pub use jobs::JobsApi;
pub use notifications::NotificationsApi;
pub use saved_jobs::SavedJobsApi;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
