//! Wire types for the agent admin API.
//!
//! Request bodies are built by callers and serialized as-is; response
//! envelopes tolerate the extra fields agents attach to their records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use trellis_core::CredentialPreview;

/// Body of `POST /schemas`.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDefinition {
    pub schema_name: String,
    pub schema_version: String,
    pub attributes: Vec<String>,
}

/// Body of `POST /issue-credential/send`: a full proposal that drives
/// the exchange from proposal through offer automatically.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialProposal {
    pub connection_id: String,
    pub schema_id: String,
    pub schema_name: String,
    pub schema_version: String,
    pub schema_issuer_did: String,
    pub issuer_did: String,
    pub cred_def_id: String,
    pub credential_proposal: CredentialPreview,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
}

/// Body of `POST /present-proof/send-request`.
#[derive(Debug, Clone, Serialize)]
pub struct ProofRequestEnvelope {
    pub connection_id: String,
    pub proof_request: ProofRequest,
    pub trace: bool,
}

/// An Indy-style proof request: named attribute and predicate
/// constraints, optionally bounded by a non-revocation interval.
#[derive(Debug, Clone, Serialize)]
pub struct ProofRequest {
    pub name: String,
    pub version: String,
    pub requested_attributes: BTreeMap<String, AttributeConstraint>,
    pub requested_predicates: BTreeMap<String, PredicateConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// One revealed attribute the prover must supply.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeConstraint {
    pub name: String,
    pub restrictions: Vec<IssuerRestriction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// One predicate the prover must satisfy without revealing the value.
#[derive(Debug, Clone, Serialize)]
pub struct PredicateConstraint {
    pub name: String,
    pub p_type: String,
    pub p_value: i64,
    pub restrictions: Vec<IssuerRestriction>,
}

/// Restricts acceptable credentials to those issued by a given DID.
#[derive(Debug, Clone, Serialize)]
pub struct IssuerRestriction {
    pub issuer_did: String,
}

/// Upper bound on how stale a non-revocation proof may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevokedInterval {
    pub to: i64,
}

/// Result of `POST /connections/create-invitation`.
#[derive(Debug, Clone, Deserialize)]
pub struct Invitation {
    pub connection_id: String,
    pub invitation: Value,
    pub invitation_url: String,
}

/// Revocation bookkeeping reported on an issued exchange record.
/// Both fields are absent when the credential definition does not
/// support revocation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueOutcome {
    #[serde(default)]
    pub revoc_reg_id: Option<String>,
    #[serde(default)]
    pub revocation_id: Option<String>,
}

impl IssueOutcome {
    /// The pair needed to revoke this credential later, when present.
    pub fn revocation_handle(&self) -> Option<(&str, &str)> {
        match (&self.revoc_reg_id, &self.revocation_id) {
            (Some(reg), Some(idx)) => Some((reg.as_str(), idx.as_str())),
            _ => None,
        }
    }
}

/// Result of `POST /present-proof/records/{id}/verify-presentation`.
#[derive(Debug, Clone, Deserialize)]
pub struct PresentationVerdict {
    pub verified: Verdict,
}

/// Agents report `verified` as a JSON bool or as the strings
/// `"true"`/`"false"` depending on their version; accept both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Verdict {
    Flag(bool),
    Label(String),
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        match self {
            Verdict::Flag(flag) => *flag,
            Verdict::Label(label) => label == "true",
        }
    }
}

/// Result of `POST /issue-credential/publish-revocations`: for each
/// revocation registry, the credential revocation ids that went out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishedRevocations {
    #[serde(default)]
    pub rrid2crid: BTreeMap<String, Vec<String>>,
}

impl PublishedRevocations {
    pub fn is_empty(&self) -> bool {
        self.rrid2crid.is_empty()
    }

    /// Total credentials revoked across all registries.
    pub fn credential_count(&self) -> usize {
        self.rrid2crid.values().map(Vec::len).sum()
    }
}
