//! Integration test: credential issuance driven end to end by webhooks.
//!
//! Provisions against an in-process mock agent, then feeds `connections`
//! and `issue_credential` webhook events through the dispatcher and
//! asserts on the admin calls the controller makes in response.

use std::sync::Arc;

use serde_json::json;

use trellis_admin::AdminClient;
use trellis_core::{CredentialExchangeState, SchemaRegistry};
use trellis_exchange::{CommandExecutor, Controller, EventDispatcher, ExchangeError};
use trellis_integration_tests::{
    provisioned_controller, sample_values, work_experience_spec, MockAgent, MOCK_PUBLIC_DID,
};

/// Drive the tracked connection to active through the webhook path.
async fn open_connection(dispatcher: &EventDispatcher, connection_id: &str) {
    dispatcher
        .dispatch(
            "connections",
            json!({ "connection_id": connection_id, "state": "request" }),
        )
        .await;
    dispatcher
        .dispatch(
            "connections",
            json!({
                "connection_id": connection_id,
                "state": "active",
                "their_label": "Peer Wallet",
            }),
        )
        .await;
}

// =========================================================================
// Startup provisioning
// =========================================================================

#[tokio::test]
async fn test_provisioning_registers_schema_and_definition() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;

    let schemas = mock.requests_to("/schemas");
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].body["schema_name"], "work_experience");
    assert_eq!(schemas[0].body["schema_version"], "1.1.1");
    assert_eq!(
        schemas[0].body["attributes"]
            .as_array()
            .map(|attributes| attributes.len()),
        Some(9)
    );

    let definitions = mock.requests_to("/credential-definitions");
    assert_eq!(definitions.len(), 1);
    assert_eq!(
        definitions[0].body["schema_id"],
        format!("{MOCK_PUBLIC_DID}:2:work_experience:1.1.1")
    );
    assert_eq!(definitions[0].body["support_revocation"], false);

    assert_eq!(mock.requests_to("/connections/create-invitation").len(), 1);
    assert_eq!(controller.connection_id(), Some(mock.connection_id()));
    assert!(!controller.is_ready(), "gate must start closed");
}

// =========================================================================
// Connection gate
// =========================================================================

#[tokio::test]
async fn test_gate_opens_for_tracked_connection_only() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());

    // A foreign connection going active must not open the gate
    dispatcher
        .dispatch(
            "connections",
            json!({ "connection_id": "someone-else", "state": "active" }),
        )
        .await;
    assert!(!controller.is_ready());

    open_connection(&dispatcher, &mock.connection_id()).await;
    assert!(controller.is_ready());

    // ready() resolves immediately once the gate is open
    controller.ready().await;
}

#[tokio::test]
async fn test_operator_commands_fail_before_connection() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;

    let before = mock.requests().len();
    let result = controller.send_message("hello").await;
    assert!(matches!(result, Err(ExchangeError::NotConnected)));

    // Validation failed before any admin call was made
    assert_eq!(mock.requests().len(), before);
}

// =========================================================================
// Webhook reactions, with replays
// =========================================================================

#[tokio::test]
async fn test_offer_received_triggers_exactly_one_send_request() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    let event = json!({
        "credential_exchange_id": "cred-ex-1",
        "state": "offer_received",
    });
    dispatcher.dispatch("issue_credential", event.clone()).await;
    dispatcher.dispatch("issue_credential", event).await;

    let requests = mock.requests_to("/issue-credential/records/cred-ex-1/send-request");
    assert_eq!(
        requests.len(),
        1,
        "a replayed offer must not re-send the request"
    );
}

#[tokio::test]
async fn test_request_received_issues_with_remembered_preview() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    // Operator starts the exchange; the proposal preview is remembered
    controller
        .issue_credential("work_experience", &sample_values())
        .await
        .expect("proposal should reach the mock agent");

    let proposals = mock.requests_to("/issue-credential/send");
    assert_eq!(proposals.len(), 1);
    let preview = &proposals[0].body["credential_proposal"];
    assert_eq!(
        preview["@type"],
        "did:sov:BzCbsNYhMrjHiqZDTUASHg;spec/issue-credential/1.0/credential-preview"
    );
    assert_eq!(preview["attributes"][0]["name"], "position");
    assert_eq!(preview["attributes"][0]["value"], "Pos");

    // The holder requests the credential; the controller answers with
    // the same preview it proposed
    dispatcher
        .dispatch(
            "issue_credential",
            json!({
                "credential_exchange_id": "cred-ex-2",
                "state": "request_received",
                "credential_definition_id": format!("{MOCK_PUBLIC_DID}:3:CL:1234:default"),
            }),
        )
        .await;

    let issues = mock.requests_to("/issue-credential/records/cred-ex-2/issue");
    assert_eq!(issues.len(), 1);
    let attributes = issues[0].body["credential_preview"]["attributes"]
        .as_array()
        .expect("issue body carries a preview");
    assert_eq!(attributes.len(), 9);
    assert_eq!(attributes[4]["name"], "periodFrom");
    assert_eq!(attributes[4]["value"], "12345");

    let comment = issues[0].body["comment"]
        .as_str()
        .expect("issue body carries a comment");
    assert!(comment.contains("work_experience"));
    assert!(comment.contains("cred-ex-2"));
}

#[tokio::test]
async fn test_credential_acked_fetches_stored_credential_once() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    let event = json!({
        "credential_exchange_id": "cred-ex-3",
        "state": "credential_acked",
        "credential_id": "stored-cred-9",
    });
    dispatcher.dispatch("issue_credential", event.clone()).await;
    dispatcher.dispatch("issue_credential", event).await;

    assert_eq!(mock.requests_to("/credential/stored-cred-9").len(), 1);
}

// =========================================================================
// Tolerance for events that need no reaction
// =========================================================================

#[tokio::test]
async fn test_unknown_topics_states_and_malformed_payloads_are_tolerated() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());

    let before = mock.requests().len();
    dispatcher
        .dispatch("revocation_registry", json!({ "anything": 1 }))
        .await;
    dispatcher
        .dispatch("issue_credential", json!({ "not": "an event" }))
        .await;
    dispatcher
        .dispatch(
            "issue_credential",
            json!({ "credential_exchange_id": "cred-ex-4", "state": "offer_sent" }),
        )
        .await;
    dispatcher
        .dispatch(
            "basicmessages",
            json!({ "connection_id": mock.connection_id(), "content": "hi there" }),
        )
        .await;

    // None of the above triggers an admin call
    assert_eq!(mock.requests().len(), before);

    // The well-formed no-op event was still recorded
    assert_eq!(
        controller.credentials().state_of("cred-ex-4"),
        Some(CredentialExchangeState::OfferSent)
    );
}

// =========================================================================
// Transport failure during a reaction
// =========================================================================

#[tokio::test]
async fn test_reaction_transport_failure_keeps_recorded_state() {
    // Point the controller at a port nothing listens on
    let admin = AdminClient::new("http://127.0.0.1:1", None);
    let registry = SchemaRegistry::new([work_experience_spec()]).expect("valid fixture spec");
    let executor = CommandExecutor::new(admin, Arc::new(registry), MOCK_PUBLIC_DID, false, 20);
    let controller = Arc::new(Controller::new(executor));
    controller.bind_connection("conn-1");
    let dispatcher = EventDispatcher::new(controller.clone());

    dispatcher
        .dispatch(
            "issue_credential",
            json!({ "credential_exchange_id": "cred-ex-5", "state": "offer_received" }),
        )
        .await;

    // The send-request reaction failed on transport, but the state stuck
    assert_eq!(
        controller.credentials().state_of("cred-ex-5"),
        Some(CredentialExchangeState::OfferReceived)
    );

    // A replay after the failure is still a duplicate
    dispatcher
        .dispatch(
            "issue_credential",
            json!({ "credential_exchange_id": "cred-ex-5", "state": "offer_received" }),
        )
        .await;
    assert_eq!(controller.credentials().len(), 1);
}
