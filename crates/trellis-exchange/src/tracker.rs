//! Per-exchange state tracking.
//!
//! The trackers decide; they never touch the network. Each `observe`
//! records the incoming state first and then reports what should
//! happen next, so a replayed notification is recognized as a
//! duplicate no matter what the caller does with the decision.

use std::sync::OnceLock;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use trellis_core::{
    ConnectionEvent, ConnectionState, CredentialExchangeEvent, CredentialExchangeState,
    ProofExchangeEvent, ProofExchangeState,
};

/// Follows the one connection this controller invited.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    tracked: OnceLock<String>,
    states: DashMap<String, ConnectionState>,
}

/// Outcome of a `connections` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionDecision {
    /// Event for some other connection; nothing recorded.
    Foreign,
    /// Lifecycle step recorded, no action needed.
    Observed,
    /// The tracked connection can now carry exchanges.
    Ready,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the tracker to the connection created from our invitation.
    /// Only the first id sticks; returns false once bound.
    pub fn track(&self, connection_id: impl Into<String>) -> bool {
        self.tracked.set(connection_id.into()).is_ok()
    }

    pub fn tracked_id(&self) -> Option<&str> {
        self.tracked.get().map(String::as_str)
    }

    /// Latest recorded state of the tracked connection.
    pub fn state(&self) -> Option<ConnectionState> {
        let id = self.tracked.get()?;
        self.states.get(id).map(|entry| entry.value().clone())
    }

    pub fn observe(&self, event: &ConnectionEvent) -> ConnectionDecision {
        let Some(tracked) = self.tracked.get() else {
            return ConnectionDecision::Foreign;
        };
        if tracked != &event.connection_id {
            return ConnectionDecision::Foreign;
        }
        let state = ConnectionState::from_label(&event.state);
        let ready = state.signals_ready();
        self.states.insert(event.connection_id.clone(), state);
        if ready {
            ConnectionDecision::Ready
        } else {
            ConnectionDecision::Observed
        }
    }
}

/// Tracks every credential exchange mentioned by the agent.
#[derive(Debug, Default)]
pub struct CredentialExchanges {
    states: DashMap<String, CredentialExchangeState>,
}

/// Outcome of an `issue_credential` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialDecision {
    /// Same state as already recorded; side effects must not repeat.
    Duplicate,
    /// New state recorded, nothing to do.
    Recorded,
    /// A credential offer arrived; accept it with a request.
    SendRequest,
    /// The peer asked for the credential; issue it from the values
    /// remembered for this definition.
    Issue {
        credential_definition_id: Option<String>,
    },
    /// The exchange settled; fetch what landed in the wallet.
    FetchStored { credential_id: Option<String> },
}

impl CredentialExchanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, event: &CredentialExchangeEvent) -> CredentialDecision {
        let state = CredentialExchangeState::from_label(&event.state);
        let previous = self
            .states
            .insert(event.credential_exchange_id.clone(), state.clone());
        if previous.as_ref() == Some(&state) {
            return CredentialDecision::Duplicate;
        }
        match state {
            CredentialExchangeState::OfferReceived => CredentialDecision::SendRequest,
            CredentialExchangeState::RequestReceived => CredentialDecision::Issue {
                credential_definition_id: event.credential_definition_id.clone(),
            },
            CredentialExchangeState::CredentialAcked => CredentialDecision::FetchStored {
                credential_id: event.credential_id.clone(),
            },
            _ => CredentialDecision::Recorded,
        }
    }

    pub fn state_of(&self, credential_exchange_id: &str) -> Option<CredentialExchangeState> {
        self.states
            .get(credential_exchange_id)
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Tracks proof-presentation exchanges and their verdicts.
#[derive(Debug, Default)]
pub struct ProofExchanges {
    states: DashMap<String, ProofExchangeState>,
    verdicts: DashMap<String, bool>,
}

/// Outcome of a `present_proof` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofDecision {
    Duplicate,
    Recorded,
    /// A presentation arrived; ask the agent to verify it.
    Verify,
}

impl ProofExchanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, event: &ProofExchangeEvent) -> ProofDecision {
        let state = ProofExchangeState::from_label(&event.state);
        let previous = self
            .states
            .insert(event.presentation_exchange_id.clone(), state.clone());
        if previous.as_ref() == Some(&state) {
            return ProofDecision::Duplicate;
        }
        if state == ProofExchangeState::PresentationReceived {
            ProofDecision::Verify
        } else {
            ProofDecision::Recorded
        }
    }

    /// Record the verification verdict. The first verdict wins;
    /// returns false when one was already recorded.
    pub fn record_verdict(&self, presentation_exchange_id: &str, verified: bool) -> bool {
        match self.verdicts.entry(presentation_exchange_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(verified);
                true
            }
        }
    }

    pub fn verdict(&self, presentation_exchange_id: &str) -> Option<bool> {
        self.verdicts
            .get(presentation_exchange_id)
            .map(|entry| *entry.value())
    }

    pub fn state_of(&self, presentation_exchange_id: &str) -> Option<ProofExchangeState> {
        self.states
            .get(presentation_exchange_id)
            .map(|entry| entry.value().clone())
    }
}
