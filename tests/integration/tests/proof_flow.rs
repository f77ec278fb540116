//! Integration test: proof requests and presentation verification.
//!
//! Checks the wire shape of outbound proof requests (restrictions,
//! predicate keys, non-revocation windows) and that presentations are
//! verified exactly once per exchange.

use serde_json::json;

use trellis_core::ProofExchangeState;
use trellis_exchange::{EventDispatcher, ExchangeError, ProofPlan, ProofPredicate};
use trellis_integration_tests::{provisioned_controller, MockAgent, MOCK_PUBLIC_DID};

/// Drive the tracked connection to active through the webhook path.
async fn open_connection(dispatcher: &EventDispatcher, connection_id: &str) {
    dispatcher
        .dispatch(
            "connections",
            json!({ "connection_id": connection_id, "state": "active" }),
        )
        .await;
}

fn work_experience_proof() -> ProofPlan {
    ProofPlan {
        name: "Proof of work_experience".to_string(),
        version: "1.0".to_string(),
        revealed: vec!["position".to_string(), "employer".to_string()],
        predicates: vec![ProofPredicate::at_least("periodFrom", 12345)],
    }
}

// =========================================================================
// Outbound proof request shape
// =========================================================================

#[tokio::test]
async fn test_proof_request_shape_with_revocation() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, true).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    controller
        .request_proof(&work_experience_proof())
        .await
        .expect("proof request should reach the mock agent");

    let sent = mock.requests_to("/present-proof/send-request");
    assert_eq!(sent.len(), 1);
    let body = &sent[0].body;
    assert_eq!(body["connection_id"], mock.connection_id());

    let proof_request = &body["proof_request"];
    assert_eq!(proof_request["name"], "Proof of work_experience");
    assert_eq!(proof_request["version"], "1.0");

    // Attribute keys follow the 0_{name}_uuid convention and are
    // restricted to our issuer DID
    let attributes = proof_request["requested_attributes"]
        .as_object()
        .expect("requested_attributes is a map");
    assert!(attributes.contains_key("0_position_uuid"));
    assert!(attributes.contains_key("0_employer_uuid"));
    let position = &attributes["0_position_uuid"];
    assert_eq!(position["name"], "position");
    assert_eq!(position["restrictions"][0]["issuer_did"], MOCK_PUBLIC_DID);

    // Revocation adds a freshness window per attribute, one second
    // behind the top-level window
    let attribute_to = position["non_revoked"]["to"]
        .as_i64()
        .expect("attribute non_revoked window");
    let top_to = proof_request["non_revoked"]["to"]
        .as_i64()
        .expect("top-level non_revoked window");
    assert_eq!(attribute_to, top_to - 1);

    let predicates = proof_request["requested_predicates"]
        .as_object()
        .expect("requested_predicates is a map");
    let predicate = &predicates["0_periodFrom_GE_uuid"];
    assert_eq!(predicate["name"], "periodFrom");
    assert_eq!(predicate["p_type"], ">=");
    assert_eq!(predicate["p_value"], 12345);
    assert_eq!(predicate["restrictions"][0]["issuer_did"], MOCK_PUBLIC_DID);
}

#[tokio::test]
async fn test_proof_request_without_revocation_omits_windows() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    controller
        .request_proof(&work_experience_proof())
        .await
        .expect("proof request should reach the mock agent");

    let sent = mock.requests_to("/present-proof/send-request");
    let proof_request = &sent[0].body["proof_request"];
    assert!(proof_request.get("non_revoked").is_none());
    assert!(proof_request["requested_attributes"]["0_position_uuid"]
        .get("non_revoked")
        .is_none());
}

#[tokio::test]
async fn test_empty_proof_plan_rejected_before_network() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    let empty = ProofPlan {
        name: "Empty".to_string(),
        version: "1.0".to_string(),
        revealed: Vec::new(),
        predicates: Vec::new(),
    };
    let result = controller.request_proof(&empty).await;
    assert!(matches!(result, Err(ExchangeError::EmptyProofPlan)));
    assert_eq!(mock.requests_to("/present-proof/send-request").len(), 0);
}

// =========================================================================
// Verification
// =========================================================================

#[tokio::test]
async fn test_presentation_received_verifies_exactly_once() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    let event = json!({
        "presentation_exchange_id": "proof-ex-1",
        "state": "presentation_received",
    });
    dispatcher.dispatch("present_proof", event.clone()).await;
    dispatcher.dispatch("present_proof", event).await;

    let verifies = mock.requests_to("/present-proof/records/proof-ex-1/verify-presentation");
    assert_eq!(
        verifies.len(),
        1,
        "a replayed presentation must not re-verify"
    );
    assert_eq!(controller.proofs().verdict("proof-ex-1"), Some(true));
}

#[tokio::test]
async fn test_failed_verdict_is_recorded() {
    let mock = MockAgent::start().await;
    mock.set_verdict(json!("false"));
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    dispatcher
        .dispatch(
            "present_proof",
            json!({
                "presentation_exchange_id": "proof-ex-2",
                "state": "presentation_received",
            }),
        )
        .await;

    assert_eq!(controller.proofs().verdict("proof-ex-2"), Some(false));
}

#[tokio::test]
async fn test_verdict_survives_later_exchange_states() {
    let mock = MockAgent::start().await;
    let controller = provisioned_controller(&mock, false).await;
    let dispatcher = EventDispatcher::new(controller.clone());
    open_connection(&dispatcher, &mock.connection_id()).await;

    dispatcher
        .dispatch(
            "present_proof",
            json!({
                "presentation_exchange_id": "proof-ex-3",
                "state": "presentation_received",
            }),
        )
        .await;
    assert_eq!(controller.proofs().verdict("proof-ex-3"), Some(true));

    // Later states on the same exchange change nothing, even if the
    // agent's answer would now differ
    mock.set_verdict(json!("false"));
    dispatcher
        .dispatch(
            "present_proof",
            json!({
                "presentation_exchange_id": "proof-ex-3",
                "state": "verified",
            }),
        )
        .await;

    let verifies = mock.requests_to("/present-proof/records/proof-ex-3/verify-presentation");
    assert_eq!(verifies.len(), 1);
    assert_eq!(controller.proofs().verdict("proof-ex-3"), Some(true));
    assert_eq!(
        controller.proofs().state_of("proof-ex-3"),
        Some(ProofExchangeState::Verified)
    );
}
