//! Tests against a running API server
//!
//! The ignored tests need `RECRUIT_API_URL` (and usually `RECRUIT_API_TOKEN`)
//! pointing at a live deployment.

use recruit_client::model::JobFilter;
use recruit_client::remote::RetryPolicy;
use recruit_client::{ClientConfig, ClientError, ResourceClient};
use std::time::Duration;

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:9/api")
        .request_timeout(Duration::from_secs(2))
        .build();
    let client = ResourceClient::http(config)
        .expect("valid config")
        .with_retry(RetryPolicy::none());

    let result = client.dashboard().stats().await;

    match result {
        Err(e @ ClientError::Network(_)) => assert!(e.is_retryable()),
        other => panic!("expected a network error, got {:?}", other),
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test --ignored
async fn test_live_job_listing() -> anyhow::Result<()> {
    let client = ResourceClient::http(ClientConfig::from_env()?)?;

    let page = client.jobs().list(&JobFilter::default()).await?;
    assert!(page.pagination.page >= 1);
    for job in &page.items {
        assert!(!job.id.is_empty());
    }
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_live_dashboard_stats() -> anyhow::Result<()> {
    let client = ResourceClient::http(ClientConfig::from_env()?)?;

    let stats = client.dashboard().stats().await?;
    println!("{:?}", stats);
    Ok(())
}
