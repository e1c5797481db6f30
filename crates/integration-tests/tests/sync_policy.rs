//! Push/pull/remove reconciliation and the fatal-vs-advisory failure policy.

use std::sync::atomic::Ordering;

use tagsmith_core::{Placement, SyncStatus};

use tagsmith_admin::models::ScriptPatch;
use tagsmith_admin::services::ScriptError;
use tagsmith_integration_tests::{TestContext, TransportCall, sample_script};

#[tokio::test]
async fn activate_without_credentials_leaves_active_unchanged() {
    let ctx = TestContext::new();

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, false))
        .await
        .expect("create");

    let err = ctx.service.set_active(created.id, true).await.unwrap_err();
    assert!(matches!(err, ScriptError::NotConfigured));

    let current = ctx.service.get(created.id).await.expect("get");
    assert!(!current.active, "active flag must not change");
    assert_eq!(current.sync_status, SyncStatus::Unsynced);
    assert!(ctx.transport.calls().is_empty(), "no remote traffic");
}

#[tokio::test]
async fn first_activation_creates_and_stores_remote_id() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, false))
        .await
        .expect("create");

    let activated = ctx
        .service
        .set_active(created.id, true)
        .await
        .expect("activate");

    assert!(activated.active);
    assert!(activated.remote_script_tag_id.is_some());
    assert_eq!(activated.sync_status, SyncStatus::Synced);

    let calls = ctx.transport.calls();
    assert_eq!(calls.len(), 1);
    assert!(
        matches!(&calls[0], TransportCall::Create(_)),
        "a fresh definition must be created, not updated"
    );
}

#[tokio::test]
async fn create_active_pushes_hosted_src() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, true))
        .await
        .expect("create");

    assert!(created.remote_script_tag_id.is_some());
    assert_eq!(created.sync_status, SyncStatus::Synced);

    let calls = ctx.transport.calls();
    assert_eq!(calls.len(), 1);
    let TransportCall::Create(payload) = &calls[0] else {
        panic!("expected a create call, got {calls:?}");
    };
    assert_eq!(payload.event, "onload");
    assert_eq!(payload.display_scope, "order_status");
    assert!(
        payload
            .src
            .starts_with(&format!("https://tags.example.com/s/{}.js?v=", created.id)),
        "src must point at the hosted body: {}",
        payload.src
    );
}

#[tokio::test]
async fn toggling_never_leaves_two_live_tags() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, true))
        .await
        .expect("create");
    let first_remote = created.remote_script_tag_id.expect("remote id");

    let deactivated = ctx
        .service
        .set_active(created.id, false)
        .await
        .expect("deactivate");
    assert!(deactivated.remote_script_tag_id.is_none());
    assert_eq!(deactivated.sync_status, SyncStatus::Unsynced);
    assert!(ctx.transport.live_tags().is_empty());

    let reactivated = ctx
        .service
        .set_active(created.id, true)
        .await
        .expect("reactivate");
    let second_remote = reactivated.remote_script_tag_id.expect("remote id");

    let live = ctx.transport.live_tags();
    assert_eq!(live.len(), 1, "exactly one live tag after re-activation");
    assert_eq!(live[0].0, second_remote.as_i64());
    assert_ne!(first_remote, second_remote, "deactivation deleted the old tag");
}

#[tokio::test]
async fn update_of_active_script_pushes_new_content_reference() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, true))
        .await
        .expect("create");
    let remote = created.remote_script_tag_id.expect("remote id");

    let updated = ctx
        .service
        .update(
            created.id,
            ScriptPatch {
                content: Some("<script>console.log('v2');</script>".to_string()),
                ..ScriptPatch::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.remote_script_tag_id, Some(remote));
    let calls = ctx.transport.calls();
    let TransportCall::Update(updated_id, payload) = calls.last().expect("calls") else {
        panic!("expected an update call, got {calls:?}");
    };
    assert_eq!(*updated_id, remote);
    assert!(payload.src.contains(&format!("/s/{}.js", created.id)));
}

#[tokio::test]
async fn failed_push_is_fatal_and_flags_sync_pending() {
    let ctx = TestContext::configured().await;
    ctx.transport.fail_next_create.store(true, Ordering::SeqCst);

    let err = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, true))
        .await
        .unwrap_err();
    assert!(matches!(err, ScriptError::Sync(_)));

    // The record survives, visibly flagged
    let all = ctx.service.list(None).await.expect("list");
    assert_eq!(all.len(), 1);
    let record = &all[0];
    assert_eq!(record.sync_status, SyncStatus::SyncPending);
    assert!(
        record
            .last_sync_error
            .as_deref()
            .is_some_and(|e| e.contains("503")),
        "last sync error is retained for display"
    );
    assert!(record.remote_script_tag_id.is_none());

    // The next explicit action re-attempts and clears the flag
    let retried = ctx
        .service
        .set_active(record.id, true)
        .await
        .expect("retry");
    assert_eq!(retried.sync_status, SyncStatus::Synced);
    assert!(retried.last_sync_error.is_none());
    assert!(retried.remote_script_tag_id.is_some());
}

#[tokio::test]
async fn failed_set_active_keeps_flag_unchanged() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, false))
        .await
        .expect("create");

    ctx.transport.fail_next_create.store(true, Ordering::SeqCst);
    let err = ctx.service.set_active(created.id, true).await.unwrap_err();
    assert!(matches!(err, ScriptError::Sync(_)));

    let current = ctx.service.get(created.id).await.expect("get");
    assert!(!current.active, "no partial state on push failure");
    assert_eq!(current.sync_status, SyncStatus::SyncPending);
}

#[tokio::test]
async fn delete_with_failing_remote_removal_warns_but_deletes() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, true))
        .await
        .expect("create");

    ctx.transport.fail_next_delete.store(true, Ordering::SeqCst);
    let outcome = ctx.service.delete(created.id).await.expect("delete");
    assert!(
        outcome.warning.is_some(),
        "remote failure must surface as an advisory warning"
    );

    let err = ctx.service.get(created.id).await.unwrap_err();
    assert!(matches!(err, ScriptError::NotFound(_)));
}

#[tokio::test]
async fn delete_removes_remote_tag_first() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, true))
        .await
        .expect("create");
    assert_eq!(ctx.transport.live_tags().len(), 1);

    let outcome = ctx.service.delete(created.id).await.expect("delete");
    assert!(outcome.warning.is_none());
    assert!(ctx.transport.live_tags().is_empty());
}

#[tokio::test]
async fn pull_is_informational_and_never_writes() {
    let ctx = TestContext::configured().await;

    let created = ctx
        .service
        .create(sample_script("GA4", Placement::ThankYouPage, true))
        .await
        .expect("create");

    let tags = ctx.service.pull_remote().await.expect("pull");
    assert_eq!(tags.len(), 1);

    // Pulling does not touch local records
    let after = ctx.service.get(created.id).await.expect("get");
    assert_eq!(after.updated_at, created.updated_at);
}

#[tokio::test]
async fn pull_without_credentials_is_not_configured() {
    let ctx = TestContext::new();
    let err = ctx.service.pull_remote().await.unwrap_err();
    assert!(matches!(err, ScriptError::NotConfigured));
}
