//! Outbound command execution.
//!
//! The executor validates every command against the registry and the
//! process configuration before the first network call, then drives
//! the agent's admin API. It keeps the attribute values of each
//! proposal so a later `request_received` can be answered with the
//! exact preview that was offered.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use trellis_admin::{
    AdminClient, AttributeConstraint, CredentialProposal, IssuerRestriction, NonRevokedInterval,
    PredicateConstraint, ProofRequest, ProofRequestEnvelope, PublishedRevocations,
};
use trellis_core::{CredentialPreview, PreviewAttribute, SchemaRegistry};

use crate::error::ExchangeError;
use crate::ledger::RevocationHandle;

/// What to ask a prover for.
#[derive(Debug, Clone)]
pub struct ProofPlan {
    /// Human-readable request name shown to the prover.
    pub name: String,
    pub version: String,
    /// Attribute names the prover must reveal.
    pub revealed: Vec<String>,
    /// Zero-knowledge predicates the prover must satisfy.
    pub predicates: Vec<ProofPredicate>,
}

/// One predicate, e.g. `age >= 18`.
#[derive(Debug, Clone)]
pub struct ProofPredicate {
    pub name: String,
    pub p_type: String,
    pub p_value: i64,
}

impl ProofPredicate {
    pub fn at_least(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            p_type: ">=".to_string(),
            p_value: value,
        }
    }
}

/// Executes operator commands and webhook reactions against the agent.
pub struct CommandExecutor {
    admin: AdminClient,
    registry: Arc<SchemaRegistry>,
    issuer_did: String,
    revocation: bool,
    registry_size: u32,
    remembered: DashMap<String, Vec<PreviewAttribute>>,
    trace_exchanges: AtomicBool,
}

impl CommandExecutor {
    pub fn new(
        admin: AdminClient,
        registry: Arc<SchemaRegistry>,
        issuer_did: impl Into<String>,
        revocation: bool,
        registry_size: u32,
    ) -> Self {
        Self {
            admin,
            registry,
            issuer_did: issuer_did.into(),
            revocation,
            registry_size,
            remembered: DashMap::new(),
            trace_exchanges: AtomicBool::new(false),
        }
    }

    pub fn revocation_enabled(&self) -> bool {
        self.revocation
    }

    /// Flip exchange tracing and return the new setting. When on,
    /// outbound issue and proof payloads carry `"trace": true` so the
    /// agent records timing for the exchange.
    pub fn toggle_tracing(&self) -> bool {
        !self.trace_exchanges.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn tracing_exchanges(&self) -> bool {
        self.trace_exchanges.load(Ordering::SeqCst)
    }

    /// The attribute values last offered for a credential definition.
    pub fn remembered_values(&self, credential_definition_id: &str) -> Option<Vec<PreviewAttribute>> {
        self.remembered
            .get(credential_definition_id)
            .map(|entry| entry.value().clone())
    }

    /// Start a credential exchange by proposing `values` for the named
    /// credential over the given connection.
    pub async fn propose_credential(
        &self,
        connection_id: &str,
        credential_name: &str,
        values: &[(String, String)],
    ) -> Result<(), ExchangeError> {
        let spec = self.registry.get(credential_name)?;
        let preview = CredentialPreview::build(spec, values)?;
        self.remembered
            .insert(spec.credential_definition_id.clone(), preview.attributes.clone());

        let proposal = CredentialProposal {
            connection_id: connection_id.to_string(),
            schema_id: spec.schema_id.to_string(),
            schema_name: spec.schema_id.name().to_string(),
            schema_version: spec.schema_id.version().to_string(),
            schema_issuer_did: spec.schema_id.issuer_did().to_string(),
            issuer_did: spec.schema_id.issuer_did().to_string(),
            cred_def_id: spec.credential_definition_id.clone(),
            credential_proposal: preview,
            trace: self.tracing_exchanges().then_some(true),
        };
        tracing::info!(
            credential = %credential_name,
            connection_id = %connection_id,
            "proposing credential"
        );
        self.admin.propose_credential(&proposal).await?;
        Ok(())
    }

    /// Accept a received offer by sending the credential request.
    pub async fn accept_offer(&self, credential_exchange_id: &str) -> Result<(), ExchangeError> {
        tracing::info!(
            credential_exchange_id = %credential_exchange_id,
            "accepting credential offer"
        );
        self.admin
            .send_credential_request(credential_exchange_id)
            .await?;
        Ok(())
    }

    /// Issue the credential a peer requested, rebuilding the preview
    /// from the values remembered for its definition. Returns the
    /// revocation handle when the definition supports revocation.
    pub async fn issue_credential(
        &self,
        credential_exchange_id: &str,
        credential_definition_id: &str,
    ) -> Result<Option<RevocationHandle>, ExchangeError> {
        let spec = self.registry.by_credential_definition(credential_definition_id)?;
        let attributes = self
            .remembered_values(credential_definition_id)
            .ok_or_else(|| ExchangeError::NoRememberedValues(credential_definition_id.to_string()))?;
        let preview = CredentialPreview::new(attributes);
        let comment = format!(
            "Issuing {} credential for exchange {credential_exchange_id}",
            spec.name
        );
        tracing::info!(
            credential_exchange_id = %credential_exchange_id,
            credential = %spec.name,
            "issuing credential"
        );
        let outcome = self
            .admin
            .issue_credential(credential_exchange_id, &comment, &preview)
            .await?;
        Ok(outcome
            .revocation_handle()
            .map(|(rev_reg_id, cred_rev_id)| RevocationHandle::new(rev_reg_id, cred_rev_id)))
    }

    /// Fetch a credential stored in the agent's wallet.
    pub async fn fetch_stored(&self, credential_id: &str) -> Result<Value, ExchangeError> {
        Ok(self.admin.stored_credential(credential_id).await?)
    }

    /// Ask the peer to prove things about credentials we issued. Every
    /// referent is restricted to this agent's issuer DID; with
    /// revocation enabled, non-revocation intervals are attached per
    /// attribute and for the request as a whole.
    pub async fn request_proof(
        &self,
        connection_id: &str,
        plan: &ProofPlan,
    ) -> Result<(), ExchangeError> {
        if plan.revealed.is_empty() && plan.predicates.is_empty() {
            return Err(ExchangeError::EmptyProofPlan);
        }
        let now = chrono::Utc::now().timestamp();

        let mut requested_attributes = BTreeMap::new();
        for name in &plan.revealed {
            requested_attributes.insert(
                format!("0_{name}_uuid"),
                AttributeConstraint {
                    name: name.clone(),
                    restrictions: vec![IssuerRestriction {
                        issuer_did: self.issuer_did.clone(),
                    }],
                    non_revoked: self.revocation.then(|| NonRevokedInterval { to: now - 1 }),
                },
            );
        }
        let mut requested_predicates = BTreeMap::new();
        for predicate in &plan.predicates {
            requested_predicates.insert(
                format!("0_{}_GE_uuid", predicate.name),
                PredicateConstraint {
                    name: predicate.name.clone(),
                    p_type: predicate.p_type.clone(),
                    p_value: predicate.p_value,
                    restrictions: vec![IssuerRestriction {
                        issuer_did: self.issuer_did.clone(),
                    }],
                },
            );
        }

        let envelope = ProofRequestEnvelope {
            connection_id: connection_id.to_string(),
            proof_request: ProofRequest {
                name: plan.name.clone(),
                version: plan.version.clone(),
                requested_attributes,
                requested_predicates,
                non_revoked: self.revocation.then(|| NonRevokedInterval { to: now }),
            },
            trace: self.tracing_exchanges(),
        };
        tracing::info!(
            request = %plan.name,
            connection_id = %connection_id,
            "sending proof request"
        );
        self.admin.send_proof_request(&envelope).await?;
        Ok(())
    }

    /// Have the agent verify a received presentation.
    pub async fn verify_presentation(
        &self,
        presentation_exchange_id: &str,
    ) -> Result<bool, ExchangeError> {
        let verdict = self
            .admin
            .verify_presentation(presentation_exchange_id)
            .await?;
        Ok(verdict.verified.is_verified())
    }

    /// Send free text over an active connection.
    pub async fn send_message(
        &self,
        connection_id: &str,
        content: &str,
    ) -> Result<(), ExchangeError> {
        self.admin.send_message(connection_id, content).await?;
        Ok(())
    }

    /// Revoke one credential by its registry handle.
    pub async fn revoke(
        &self,
        rev_reg_id: &str,
        cred_rev_id: &str,
        publish: bool,
    ) -> Result<(), ExchangeError> {
        if !self.revocation {
            return Err(ExchangeError::RevocationDisabled);
        }
        if rev_reg_id.trim().is_empty() || cred_rev_id.trim().is_empty() {
            return Err(ExchangeError::MissingRevocationHandle);
        }
        tracing::info!(
            rev_reg_id = %rev_reg_id,
            cred_rev_id = %cred_rev_id,
            publish,
            "revoking credential"
        );
        self.admin
            .revoke_credential(rev_reg_id, cred_rev_id, publish)
            .await?;
        Ok(())
    }

    /// Publish every staged revocation.
    pub async fn publish_revocations(&self) -> Result<PublishedRevocations, ExchangeError> {
        if !self.revocation {
            return Err(ExchangeError::RevocationDisabled);
        }
        Ok(self.admin.publish_revocations().await?)
    }

    /// Create an additional revocation registry for a credential
    /// definition, sized to the configured capacity.
    pub async fn add_revocation_registry(
        &self,
        credential_name: &str,
    ) -> Result<(), ExchangeError> {
        if !self.revocation {
            return Err(ExchangeError::RevocationDisabled);
        }
        let spec = self.registry.get(credential_name)?;
        tracing::info!(
            credential = %credential_name,
            size = self.registry_size,
            "creating revocation registry"
        );
        self.admin
            .create_revocation_registry(&spec.credential_definition_id, self.registry_size)
            .await?;
        Ok(())
    }
}
