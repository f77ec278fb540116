//! Webhook topics and their decoded payloads.
//!
//! The agent pushes a JSON document per state change to
//! `POST /topic/{topic}/`. These types capture only the fields the
//! controller acts on; everything else in the document is ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Webhook topics this controller handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookTopic {
    /// Connection record state changes.
    Connections,
    /// Credential-issuance exchange state changes.
    IssueCredential,
    /// Proof-presentation exchange state changes.
    PresentProof,
    /// Free-text messages from the other party.
    BasicMessages,
}

impl WebhookTopic {
    /// The topic path segment used by the agent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connections => "connections",
            Self::IssueCredential => "issue_credential",
            Self::PresentProof => "present_proof",
            Self::BasicMessages => "basicmessages",
        }
    }
}

impl FromStr for WebhookTopic {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connections" => Ok(Self::Connections),
            "issue_credential" => Ok(Self::IssueCredential),
            "present_proof" => Ok(Self::PresentProof),
            "basicmessages" => Ok(Self::BasicMessages),
            other => Err(CoreError::UnknownTopic(other.to_string())),
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a `connections` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub connection_id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_label: Option<String>,
}

/// Payload of an `issue_credential` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialExchangeEvent {
    pub credential_exchange_id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_definition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    /// Referent of the stored credential, present once acked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_request_metadata: Option<serde_json::Value>,
}

/// Payload of a `present_proof` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofExchangeEvent {
    pub presentation_exchange_id: String,
    pub state: String,
}

/// Payload of a `basicmessages` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicMessageEvent {
    pub connection_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}
