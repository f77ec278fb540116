//! The controller ties the pieces together: trackers decide what a
//! webhook event means, the executor acts on it, the gate and ledger
//! keep session state, and operator commands come in from the side.

use std::future::Future;

use trellis_admin::PublishedRevocations;
use trellis_core::{
    BasicMessageEvent, ConnectionEvent, CredentialExchangeEvent, ProofExchangeEvent,
};

use crate::error::ExchangeError;
use crate::executor::{CommandExecutor, ProofPlan};
use crate::gate::ReadyGate;
use crate::ledger::{RevocationHandle, RevocationLedger};
use crate::tracker::{
    ConnectionDecision, ConnectionTracker, CredentialDecision, CredentialExchanges, ProofDecision,
    ProofExchanges,
};

/// Webhook reactions are best effort: a failed admin call must never
/// take the dispatcher down, and a transport blip is not worth more
/// than a warning.
async fn run_reaction<T, F>(action: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, ExchangeError>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(err) if err.is_transport() => {
            tracing::warn!(error = %err, "{} failed, continuing", action);
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "{} failed", action);
            None
        }
    }
}

/// One controller per agent session.
pub struct Controller {
    gate: ReadyGate,
    connections: ConnectionTracker,
    credentials: CredentialExchanges,
    proofs: ProofExchanges,
    ledger: RevocationLedger,
    executor: CommandExecutor,
}

impl Controller {
    pub fn new(executor: CommandExecutor) -> Self {
        Self {
            gate: ReadyGate::new(),
            connections: ConnectionTracker::new(),
            credentials: CredentialExchanges::new(),
            proofs: ProofExchanges::new(),
            ledger: RevocationLedger::new(),
            executor,
        }
    }

    /// Bind to the connection created from our invitation. Must happen
    /// before the peer's connection events can be attributed.
    pub fn bind_connection(&self, connection_id: &str) -> bool {
        let bound = self.connections.track(connection_id);
        if bound {
            tracing::info!(connection_id = %connection_id, "tracking invited connection");
        }
        bound
    }

    pub fn connection_id(&self) -> Option<String> {
        self.connections.tracked_id().map(str::to_string)
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Resolve once the tracked connection is active.
    pub async fn ready(&self) {
        self.gate.ready().await;
    }

    pub fn connections(&self) -> &ConnectionTracker {
        &self.connections
    }

    pub fn credentials(&self) -> &CredentialExchanges {
        &self.credentials
    }

    pub fn proofs(&self) -> &ProofExchanges {
        &self.proofs
    }

    pub fn revocations(&self) -> &RevocationLedger {
        &self.ledger
    }

    pub fn revocation_enabled(&self) -> bool {
        self.executor.revocation_enabled()
    }

    pub fn toggle_tracing(&self) -> bool {
        self.executor.toggle_tracing()
    }

    pub async fn handle_connection(&self, event: ConnectionEvent) {
        match self.connections.observe(&event) {
            ConnectionDecision::Foreign => {
                tracing::debug!(
                    connection_id = %event.connection_id,
                    state = %event.state,
                    "ignoring event for foreign connection"
                );
            }
            ConnectionDecision::Observed => {
                tracing::debug!(
                    connection_id = %event.connection_id,
                    state = %event.state,
                    "connection state recorded"
                );
            }
            ConnectionDecision::Ready => {
                if self.gate.mark_ready() {
                    tracing::info!(
                        connection_id = %event.connection_id,
                        state = %event.state,
                        label = event.their_label.as_deref().unwrap_or("-"),
                        "connection is ready"
                    );
                } else {
                    tracing::debug!(
                        connection_id = %event.connection_id,
                        state = %event.state,
                        "connection already ready"
                    );
                }
            }
        }
    }

    pub async fn handle_credential(&self, event: CredentialExchangeEvent) {
        let id = event.credential_exchange_id.clone();
        let decision = self.credentials.observe(&event);
        if decision == CredentialDecision::Duplicate {
            tracing::debug!(
                credential_exchange_id = %id,
                state = %event.state,
                "duplicate credential event dropped"
            );
            return;
        }
        tracing::info!(
            credential_exchange_id = %id,
            state = %event.state,
            "credential exchange update"
        );
        match decision {
            CredentialDecision::SendRequest => {
                run_reaction("send credential request", self.executor.accept_offer(&id)).await;
            }
            CredentialDecision::Issue {
                credential_definition_id,
            } => {
                let Some(cred_def_id) = credential_definition_id else {
                    tracing::warn!(
                        credential_exchange_id = %id,
                        "credential request carried no credential_definition_id"
                    );
                    return;
                };
                let issued = run_reaction(
                    "issue credential",
                    self.executor.issue_credential(&id, &cred_def_id),
                )
                .await;
                if let Some(Some(handle)) = issued {
                    tracing::info!(
                        credential_exchange_id = %id,
                        rev_reg_id = %handle.rev_reg_id,
                        cred_rev_id = %handle.cred_rev_id,
                        "issued credential is revocable"
                    );
                    self.ledger.record_issued(&id, handle);
                }
            }
            CredentialDecision::FetchStored { credential_id } => {
                let Some(credential_id) = credential_id else {
                    tracing::warn!(
                        credential_exchange_id = %id,
                        "credential ack carried no credential_id"
                    );
                    return;
                };
                let stored = run_reaction(
                    "fetch stored credential",
                    self.executor.fetch_stored(&credential_id),
                )
                .await;
                if let Some(stored) = stored {
                    tracing::info!(
                        credential_id = %credential_id,
                        credential_definition_id = event.credential_definition_id.as_deref().unwrap_or("-"),
                        schema_id = event.schema_id.as_deref().unwrap_or("-"),
                        request_metadata = ?event.credential_request_metadata,
                        credential = %stored,
                        "credential stored in wallet"
                    );
                }
            }
            CredentialDecision::Duplicate | CredentialDecision::Recorded => {}
        }
    }

    pub async fn handle_proof(&self, event: ProofExchangeEvent) {
        let id = event.presentation_exchange_id.clone();
        let decision = self.proofs.observe(&event);
        if decision == ProofDecision::Duplicate {
            tracing::debug!(
                presentation_exchange_id = %id,
                state = %event.state,
                "duplicate proof event dropped"
            );
            return;
        }
        tracing::info!(
            presentation_exchange_id = %id,
            state = %event.state,
            "proof exchange update"
        );
        if decision == ProofDecision::Verify {
            let verified =
                run_reaction("verify presentation", self.executor.verify_presentation(&id)).await;
            if let Some(verified) = verified {
                if self.proofs.record_verdict(&id, verified) {
                    tracing::info!(
                        presentation_exchange_id = %id,
                        verified,
                        "presentation verified"
                    );
                }
            }
        }
    }

    pub async fn handle_basic_message(&self, event: BasicMessageEvent) {
        tracing::info!(
            connection_id = %event.connection_id,
            message_id = event.message_id.as_deref().unwrap_or("-"),
            content = %event.content,
            "received basic message"
        );
    }

    fn require_connection(&self) -> Result<String, ExchangeError> {
        if !self.gate.is_ready() {
            return Err(ExchangeError::NotConnected);
        }
        self.connections
            .tracked_id()
            .map(str::to_string)
            .ok_or(ExchangeError::NotConnected)
    }

    /// Propose a credential to the connected peer.
    pub async fn issue_credential(
        &self,
        credential_name: &str,
        values: &[(String, String)],
    ) -> Result<(), ExchangeError> {
        let connection_id = self.require_connection()?;
        self.executor
            .propose_credential(&connection_id, credential_name, values)
            .await
    }

    /// Ask the connected peer for a proof.
    pub async fn request_proof(&self, plan: &ProofPlan) -> Result<(), ExchangeError> {
        let connection_id = self.require_connection()?;
        self.executor.request_proof(&connection_id, plan).await
    }

    /// Send free text to the connected peer.
    pub async fn send_message(&self, content: &str) -> Result<(), ExchangeError> {
        let connection_id = self.require_connection()?;
        self.executor.send_message(&connection_id, content).await
    }

    /// Revoke a credential by handle. Best effort past validation: a
    /// transport failure is logged and swallowed. An unpublished
    /// revoke is staged in the ledger for a later publish-all.
    pub async fn revoke_credential(
        &self,
        rev_reg_id: &str,
        cred_rev_id: &str,
        publish: bool,
    ) -> Result<(), ExchangeError> {
        match self.executor.revoke(rev_reg_id, cred_rev_id, publish).await {
            Ok(()) => {
                if !publish {
                    self.ledger
                        .queue(RevocationHandle::new(rev_reg_id, cred_rev_id));
                    tracing::info!(
                        pending = self.ledger.pending_count(),
                        "revocation staged for later publish"
                    );
                }
                Ok(())
            }
            Err(err) if err.is_transport() => {
                tracing::warn!(error = %err, "revocation not delivered");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Publish all staged revocations. Best effort past validation.
    pub async fn publish_revocations(&self) -> Result<PublishedRevocations, ExchangeError> {
        match self.executor.publish_revocations().await {
            Ok(published) => {
                let cleared = self.ledger.mark_published(&published.rrid2crid);
                tracing::info!(
                    registries = published.rrid2crid.len(),
                    credentials = published.credential_count(),
                    cleared,
                    "revocations published"
                );
                Ok(published)
            }
            Err(err) if err.is_transport() => {
                tracing::warn!(error = %err, "publish revocations not delivered");
                Ok(PublishedRevocations::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Create an extra revocation registry for a credential definition.
    pub async fn add_revocation_registry(
        &self,
        credential_name: &str,
    ) -> Result<(), ExchangeError> {
        self.executor.add_revocation_registry(credential_name).await
    }
}
