//! Webhook dispatch.
//!
//! Turns raw `(topic, payload)` deliveries into typed events and runs
//! the matching controller handler. Deliveries for the same exchange
//! id are serialized through a per-id async lock so a fast follow-up
//! event cannot overtake the reaction to the previous one; unrelated
//! ids proceed concurrently. A lock entry is dropped once its exchange
//! reaches the terminal state, so the map stays bounded by the number
//! of live exchanges. The dispatcher never returns an error: whatever
//! goes wrong is logged and the delivery is dropped.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;

use trellis_core::{
    BasicMessageEvent, ConnectionEvent, ConnectionState, CredentialExchangeEvent,
    CredentialExchangeState, ProofExchangeEvent, ProofExchangeState, WebhookTopic,
};

use crate::controller::Controller;

pub struct EventDispatcher {
    controller: Arc<Controller>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EventDispatcher {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self {
            controller,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        self.locks.entry(key).or_default().value().clone()
    }

    pub async fn dispatch(&self, topic: &str, payload: Value) {
        let parsed = match topic.parse::<WebhookTopic>() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(topic = %topic, "unknown webhook topic dropped");
                return;
            }
        };
        match parsed {
            WebhookTopic::Connections => match serde_json::from_value::<ConnectionEvent>(payload) {
                Ok(event) => {
                    let key = format!("conn:{}", event.connection_id);
                    let terminal = ConnectionState::from_label(&event.state).is_terminal();
                    {
                        let lock = self.lock_for(key.clone());
                        let _held = lock.lock().await;
                        self.controller.handle_connection(event).await;
                    }
                    if terminal {
                        self.locks.remove(&key);
                    }
                }
                Err(err) => {
                    tracing::warn!(topic = %topic, error = %err, "malformed webhook payload dropped");
                }
            },
            WebhookTopic::IssueCredential => {
                match serde_json::from_value::<CredentialExchangeEvent>(payload) {
                    Ok(event) => {
                        let key = format!("cred:{}", event.credential_exchange_id);
                        let terminal =
                            CredentialExchangeState::from_label(&event.state).is_terminal();
                        {
                            let lock = self.lock_for(key.clone());
                            let _held = lock.lock().await;
                            self.controller.handle_credential(event).await;
                        }
                        if terminal {
                            self.locks.remove(&key);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(topic = %topic, error = %err, "malformed webhook payload dropped");
                    }
                }
            }
            WebhookTopic::PresentProof => {
                match serde_json::from_value::<ProofExchangeEvent>(payload) {
                    Ok(event) => {
                        let key = format!("proof:{}", event.presentation_exchange_id);
                        let terminal = ProofExchangeState::from_label(&event.state).is_terminal();
                        {
                            let lock = self.lock_for(key.clone());
                            let _held = lock.lock().await;
                            self.controller.handle_proof(event).await;
                        }
                        if terminal {
                            self.locks.remove(&key);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(topic = %topic, error = %err, "malformed webhook payload dropped");
                    }
                }
            }
            WebhookTopic::BasicMessages => {
                match serde_json::from_value::<BasicMessageEvent>(payload) {
                    Ok(event) => self.controller.handle_basic_message(event).await,
                    Err(err) => {
                        tracing::warn!(topic = %topic, error = %err, "malformed webhook payload dropped");
                    }
                }
            }
        }
    }
}
