//! Client for the admin API of an Aries-compatible cloud agent.
//!
//! The agent does the cryptography and the DIDComm transport; this
//! crate drives it over HTTP: registering schemas, opening
//! connections, and stepping credential and proof exchanges forward.

pub mod client;
pub mod error;
pub mod types;

pub use client::AdminClient;
pub use error::AdminError;
pub use types::{
    AttributeConstraint, CredentialProposal, Invitation, IssueOutcome, IssuerRestriction,
    NonRevokedInterval, PredicateConstraint, PresentationVerdict, ProofRequest,
    ProofRequestEnvelope, PublishedRevocations, SchemaDefinition, Verdict,
};
