//! Integration test: revocation staging, publishing, and validation.
//!
//! Issued credentials must land in the revocation ledger, unpublished
//! revokes must stage and clear on publish, and bad operator input must
//! be rejected before any admin call goes out.

use std::sync::Arc;

use serde_json::json;

use trellis_admin::AdminClient;
use trellis_core::SchemaRegistry;
use trellis_exchange::{
    CommandExecutor, Controller, EventDispatcher, ExchangeError, RevocationHandle,
};
use trellis_integration_tests::{
    provisioned_controller, sample_values, work_experience_spec, MockAgent, MOCK_PUBLIC_DID,
};

fn registry_id() -> String {
    format!("{MOCK_PUBLIC_DID}:4:{MOCK_PUBLIC_DID}:3:CL:1234:default:CL_ACCUM:0")
}

// =========================================================================
// Issuance feeds the ledger
// =========================================================================

#[tokio::test]
async fn test_issued_credential_lands_in_revocation_ledger() {
    let mock = MockAgent::start().await;
    mock.issue_with_revocation(&registry_id(), "1");
    let controller = provisioned_controller(&mock, true).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    dispatcher
        .dispatch(
            "connections",
            json!({ "connection_id": mock.connection_id(), "state": "active" }),
        )
        .await;

    // Revocation support is requested at provisioning time
    let definitions = mock.requests_to("/credential-definitions");
    assert_eq!(definitions[0].body["support_revocation"], true);

    controller
        .issue_credential("work_experience", &sample_values())
        .await
        .expect("proposal should reach the mock agent");
    dispatcher
        .dispatch(
            "issue_credential",
            json!({
                "credential_exchange_id": "cred-ex-1",
                "state": "request_received",
                "credential_definition_id": format!("{MOCK_PUBLIC_DID}:3:CL:1234:default"),
            }),
        )
        .await;

    let handle = controller
        .revocations()
        .issued_handle("cred-ex-1")
        .expect("issue response ids should be remembered");
    assert_eq!(handle.rev_reg_id, registry_id());
    assert_eq!(handle.cred_rev_id, "1");
}

// =========================================================================
// Staging and publishing
// =========================================================================

#[tokio::test]
async fn test_staged_revocations_publish_and_clear() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, true).await;

    controller
        .revoke_credential(&registry_id(), "1", false)
        .await
        .expect("staged revoke should succeed");
    controller
        .revoke_credential(&registry_id(), "2", false)
        .await
        .expect("staged revoke should succeed");
    assert_eq!(
        controller.revocations().pending(),
        vec![
            RevocationHandle::new(registry_id(), "1"),
            RevocationHandle::new(registry_id(), "2"),
        ]
    );

    let revokes = mock.requests_to("/issue-credential/revoke");
    assert_eq!(revokes.len(), 2);
    assert_eq!(
        revokes[0].query.get("publish").map(String::as_str),
        Some("false")
    );
    assert_eq!(
        revokes[0].query.get("rev_reg_id").map(String::as_str),
        Some(registry_id().as_str())
    );
    assert_eq!(
        revokes[1].query.get("cred_rev_id").map(String::as_str),
        Some("2")
    );

    let published = controller
        .publish_revocations()
        .await
        .expect("publish should succeed");
    assert_eq!(published.credential_count(), 2);
    assert_eq!(
        controller.revocations().pending_count(),
        0,
        "published handles must leave the pending set"
    );
}

#[tokio::test]
async fn test_immediate_publish_is_not_staged() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, true).await;

    controller
        .revoke_credential(&registry_id(), "5", true)
        .await
        .expect("published revoke should succeed");
    assert_eq!(controller.revocations().pending_count(), 0);

    let revokes = mock.requests_to("/issue-credential/revoke");
    assert_eq!(
        revokes[0].query.get("publish").map(String::as_str),
        Some("true")
    );
}

// =========================================================================
// Validation happens before the network
// =========================================================================

#[tokio::test]
async fn test_blank_handles_rejected_before_network() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, true).await;

    let before = mock.requests().len();
    let result = controller.revoke_credential("", "7", true).await;
    assert!(matches!(
        result,
        Err(ExchangeError::MissingRevocationHandle)
    ));
    let result = controller.revoke_credential(&registry_id(), "  ", true).await;
    assert!(matches!(
        result,
        Err(ExchangeError::MissingRevocationHandle)
    ));
    assert_eq!(mock.requests().len(), before);
}

#[tokio::test]
async fn test_disabled_revocation_rejects_every_command() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;

    let before = mock.requests().len();
    let result = controller.revoke_credential(&registry_id(), "1", true).await;
    assert!(matches!(result, Err(ExchangeError::RevocationDisabled)));
    let result = controller.publish_revocations().await;
    assert!(matches!(result, Err(ExchangeError::RevocationDisabled)));
    let result = controller.add_revocation_registry("work_experience").await;
    assert!(matches!(result, Err(ExchangeError::RevocationDisabled)));
    assert_eq!(mock.requests().len(), before);
}

// =========================================================================
// Best effort past validation
// =========================================================================

#[tokio::test]
async fn test_revoke_transport_failure_is_swallowed() {
    // Valid handles, dead agent
    let admin = AdminClient::new("http://127.0.0.1:1", None);
    let registry = SchemaRegistry::new([work_experience_spec()]).expect("valid fixture spec");
    let executor = CommandExecutor::new(admin, Arc::new(registry), MOCK_PUBLIC_DID, true, 20);
    let controller = Controller::new(executor);

    controller
        .revoke_credential(&registry_id(), "1", false)
        .await
        .expect("transport failure is logged, not surfaced");

    // An undelivered revoke is not staged for publish
    assert_eq!(controller.revocations().pending_count(), 0);

    let published = controller
        .publish_revocations()
        .await
        .expect("transport failure is logged, not surfaced");
    assert!(published.is_empty());
}

// =========================================================================
// Extra registries
// =========================================================================

#[tokio::test]
async fn test_add_revocation_registry_posts_configured_size() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, true).await;

    // Provisioning already created the initial registry
    let initial = mock.requests_to("/revocation/create-registry");
    assert_eq!(initial.len(), 1);

    controller
        .add_revocation_registry("work_experience")
        .await
        .expect("registry creation should reach the mock agent");

    let creates = mock.requests_to("/revocation/create-registry");
    assert_eq!(creates.len(), 2);
    assert_eq!(creates[1].body["max_cred_num"], 20);
    assert_eq!(
        creates[1].body["credential_definition_id"],
        format!("{MOCK_PUBLIC_DID}:3:CL:1234:default")
    );

    // Unknown credential names fail before the network
    let before = mock.requests().len();
    let result = controller.add_revocation_registry("unknown").await;
    assert!(result.is_err());
    assert_eq!(mock.requests().len(), before);
}
