//! Application status transitions through the bindings, against a scripted
//! server

mod common;

use common::{application, bindings, MockTransport};
use recruit_client::model::{
    ApplicationFilter, ApplicationStatus, BulkStatusUpdate, RejectApplication,
};
use recruit_client::remote::Method;
use recruit_client::ClientError;
use serde_json::json;

const DETAIL: &str = "/jobs/applications/A1";
const STATUS: &str = "/jobs/applications/A1/status";

#[tokio::test]
async fn test_shortlist_rejected_application_is_refused_locally() {
    let transport = MockTransport::new();
    transport.ok(Method::Get, DETAIL, application("A1", "J1", "rejected"));
    let bindings = bindings(&transport);

    let detail = bindings.applications().detail("A1").await;
    assert_eq!(
        detail.fetch().await.data.unwrap().status,
        ApplicationStatus::Rejected
    );

    let hook = bindings.applications().shortlist();
    let err = hook.mutate("A1".to_string()).await.unwrap_err();

    assert!(matches!(err, ClientError::StateConflict { .. }));
    assert!(hook.error().unwrap().is_state_conflict());
    // Never reached the server, but the detail was re-read
    assert_eq!(transport.count(Method::Patch, STATUS), 0);
    assert_eq!(transport.count(Method::Get, DETAIL), 2);
}

#[tokio::test]
async fn test_server_conflict_refreshes_detail() {
    let transport = MockTransport::new();
    transport.ok(Method::Get, DETAIL, application("A1", "J1", "reviewing"));
    transport.ok(Method::Get, DETAIL, application("A1", "J1", "rejected"));
    transport.fail(Method::Patch, STATUS, 409, "Application is already rejected");
    let bindings = bindings(&transport);

    let detail = bindings.applications().detail("A1").await;
    detail.fetch().await;

    let err = bindings
        .applications()
        .shortlist()
        .mutate("A1".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::conflict("Application is already rejected"));

    let state = detail.state().await;
    assert_eq!(state.data.unwrap().status, ApplicationStatus::Rejected);
    assert_eq!(transport.count(Method::Patch, STATUS), 1);
}

#[tokio::test]
async fn test_padded_id_shares_the_transition_refresh() {
    let transport = MockTransport::new();
    transport.ok(Method::Get, DETAIL, application("A1", "J1", "reviewing"));
    transport.ok(Method::Get, DETAIL, application("A1", "J1", "shortlisted"));
    transport.ok(Method::Patch, STATUS, application("A1", "J1", "shortlisted"));
    let bindings = bindings(&transport);

    let detail = bindings.applications().detail(" A1").await;
    assert_eq!(detail.key(), &recruit_client::keys::applications::detail("A1"));
    detail.fetch().await;

    bindings
        .applications()
        .shortlist()
        .mutate("A1".to_string())
        .await
        .unwrap();

    assert_eq!(transport.count(Method::Get, DETAIL), 2);
    assert_eq!(
        detail.state().await.data.unwrap().status,
        ApplicationStatus::Shortlisted
    );
}

#[tokio::test]
async fn test_conflict_without_cached_detail_is_sent_to_server() {
    let transport = MockTransport::new();
    transport.fail(Method::Patch, STATUS, 409, "Application is already accepted");
    let bindings = bindings(&transport);

    let err = bindings
        .applications()
        .accept()
        .mutate("A1".to_string())
        .await
        .unwrap_err();

    assert!(err.is_state_conflict());
    assert_eq!(transport.count(Method::Patch, STATUS), 1);
}

#[tokio::test]
async fn test_transition_refreshes_job_scopes() {
    let transport = MockTransport::new();
    transport.ok(Method::Get, "/jobs/J1/applications", json!([]));
    transport.ok(Method::Get, "/jobs/applications/stats", json!({"total": 1, "reviewing": 1}));
    transport.ok(Method::Get, "/jobs/J1", common::job("J1", "active"));
    transport.ok(Method::Patch, STATUS, application("A1", "J1", "shortlisted"));
    let bindings = bindings(&transport);

    let by_job = bindings
        .applications()
        .by_job("J1", ApplicationFilter::default())
        .await;
    let stats = bindings.applications().stats().await;
    let job = bindings.jobs().detail("J1").await;
    by_job.fetch().await;
    stats.fetch().await;
    job.fetch().await;

    let updated = bindings
        .applications()
        .shortlist()
        .mutate("A1".to_string())
        .await
        .unwrap();
    assert_eq!(updated.status, ApplicationStatus::Shortlisted);

    let body = transport.last(Method::Patch, STATUS).unwrap().body.unwrap();
    assert_eq!(body, json!({"status": "shortlisted"}));

    assert_eq!(transport.count(Method::Get, "/jobs/J1/applications"), 2);
    assert_eq!(transport.count(Method::Get, "/jobs/applications/stats"), 2);
    assert_eq!(transport.count(Method::Get, "/jobs/J1"), 2);
}

#[tokio::test]
async fn test_reject_sends_reason() {
    let transport = MockTransport::new();
    transport.ok(Method::Patch, STATUS, application("A1", "J1", "rejected"));
    let bindings = bindings(&transport);

    bindings
        .applications()
        .reject()
        .mutate(RejectApplication {
            application_id: "A1".to_string(),
            reason: Some("Position filled".to_string()),
        })
        .await
        .unwrap();

    let body = transport.last(Method::Patch, STATUS).unwrap().body.unwrap();
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejectionReason"], "Position filled");
}

#[tokio::test]
async fn test_withdraw_uses_dedicated_endpoint() {
    let transport = MockTransport::new();
    let path = "/jobs/applications/A1/withdraw";
    transport.ok(Method::Patch, path, application("A1", "J1", "withdrawn"));
    let bindings = bindings(&transport);

    let withdrawn = bindings
        .applications()
        .withdraw()
        .mutate("A1".to_string())
        .await
        .unwrap();

    assert!(withdrawn.is_withdrawn);
    assert!(withdrawn.check_invariants().is_ok());
    assert_eq!(transport.count(Method::Patch, path), 1);
    assert_eq!(transport.count(Method::Patch, STATUS), 0);
}

#[tokio::test]
async fn test_bulk_partial_failure_still_invalidates_shared_scopes() {
    let transport = MockTransport::new();
    transport.ok(Method::Get, "/jobs/applications", json!([]));
    transport.ok(Method::Get, "/jobs/applications/stats", json!({"total": 3}));
    transport.ok(
        Method::Patch,
        "/jobs/applications/bulk-status",
        json!({
            "updated": [
                application("A", "J1", "reviewing"),
                application("C", "J2", "reviewing")
            ],
            "failed": [
                {"id": "B", "code": "STATE_CONFLICT", "message": "Application is withdrawn"}
            ]
        }),
    );
    let bindings = bindings(&transport);

    let list = bindings.applications().list(ApplicationFilter::default()).await;
    let stats = bindings.applications().stats().await;
    list.fetch().await;
    stats.fetch().await;

    let outcome = bindings
        .applications()
        .bulk_update_status()
        .mutate(BulkStatusUpdate {
            application_ids: vec!["A".into(), "B".into(), "C".into()],
            status: ApplicationStatus::Reviewing,
            notes: None,
        })
        .await
        .unwrap();

    assert_eq!(outcome.items.len(), 3);
    assert!(outcome.result_for("A").unwrap().is_ok());
    assert!(outcome.result_for("C").unwrap().is_ok());
    assert!(outcome.result_for("B").unwrap().as_ref().unwrap_err().is_state_conflict());
    assert!(!outcome.all_succeeded());

    assert_eq!(transport.count(Method::Get, "/jobs/applications"), 2);
    assert_eq!(transport.count(Method::Get, "/jobs/applications/stats"), 2);
}

#[tokio::test]
async fn test_bulk_with_no_success_leaves_lists_alone() {
    let transport = MockTransport::new();
    transport.ok(Method::Get, "/jobs/applications", json!([]));
    transport.ok(
        Method::Patch,
        "/jobs/applications/bulk-status",
        json!({
            "updated": [],
            "failed": [{"id": "A", "code": "NOT_FOUND", "message": "No such application"}]
        }),
    );
    let bindings = bindings(&transport);

    let list = bindings.applications().list(ApplicationFilter::default()).await;
    list.fetch().await;

    let outcome = bindings
        .applications()
        .bulk_update_status()
        .mutate(BulkStatusUpdate {
            application_ids: vec!["A".into()],
            status: ApplicationStatus::Rejected,
            notes: None,
        })
        .await
        .unwrap();

    assert!(!outcome.any_succeeded());
    assert!(matches!(
        outcome.result_for("A"),
        Some(Err(ClientError::NotFound(_)))
    ));
    assert_eq!(transport.count(Method::Get, "/jobs/applications"), 1);
}

#[tokio::test]
async fn test_bulk_back_to_pending_is_refused_before_sending() {
    let transport = MockTransport::new();
    let bindings = bindings(&transport);

    let err = bindings
        .applications()
        .bulk_update_status()
        .mutate(BulkStatusUpdate {
            application_ids: vec!["A".into()],
            status: ApplicationStatus::Pending,
            notes: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation { .. }));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_bulk_malformed_id_fails_alone() {
    let transport = MockTransport::new();
    transport.ok(
        Method::Patch,
        "/jobs/applications/bulk-status",
        json!({"updated": [application("A", "J1", "reviewing")], "failed": []}),
    );
    let bindings = bindings(&transport);

    let outcome = bindings
        .applications()
        .bulk_update_status()
        .mutate(BulkStatusUpdate {
            application_ids: vec!["A".into(), "../B".into()],
            status: ApplicationStatus::Reviewing,
            notes: None,
        })
        .await
        .unwrap();

    assert_eq!(outcome.items.len(), 2);
    assert!(outcome.result_for("A").unwrap().is_ok());
    assert!(matches!(
        outcome.result_for("../B"),
        Some(Err(ClientError::Validation { .. }))
    ));

    let body = transport
        .last(Method::Patch, "/jobs/applications/bulk-status")
        .unwrap()
        .body
        .unwrap();
    assert_eq!(body["applicationIds"], json!(["A"]));
}

#[tokio::test]
async fn test_bulk_with_only_malformed_ids_sends_nothing() {
    let transport = MockTransport::new();
    let bindings = bindings(&transport);

    let outcome = bindings
        .applications()
        .bulk_update_status()
        .mutate(BulkStatusUpdate {
            application_ids: vec![" ".into(), "a/b".into()],
            status: ApplicationStatus::Rejected,
            notes: None,
        })
        .await
        .unwrap();

    assert!(!outcome.any_succeeded());
    assert_eq!(outcome.failed().count(), 2);
    assert!(transport.requests().is_empty());
}
