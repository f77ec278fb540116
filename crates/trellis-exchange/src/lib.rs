//! The controller core: webhook dispatch, exchange state tracking,
//! and command execution against an Aries-compatible agent.
//!
//! Events flow in one direction: the node's webhook listener hands
//! `(topic, payload)` pairs to the [`EventDispatcher`], which
//! serializes same-exchange deliveries and calls into the
//! [`Controller`]. The controller's trackers decide what each event
//! means; its [`CommandExecutor`] performs the resulting admin-API
//! calls. Operator commands enter through the controller directly.

pub mod controller;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod gate;
pub mod ledger;
pub mod provision;
pub mod tracker;

pub use controller::Controller;
pub use dispatch::EventDispatcher;
pub use error::ExchangeError;
pub use executor::{CommandExecutor, ProofPlan, ProofPredicate};
pub use gate::ReadyGate;
pub use ledger::{RevocationHandle, RevocationLedger};
pub use provision::{provision, CredentialPlan, Provisioned, STATUS_ATTEMPTS, STATUS_INTERVAL};
pub use tracker::{
    ConnectionDecision, ConnectionTracker, CredentialDecision, CredentialExchanges, ProofDecision,
    ProofExchanges,
};
