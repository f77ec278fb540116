//! Exchange states, schema identifiers, webhook payload types, and the
//! schema registry shared by every other Trellis crate.

pub mod error;
pub mod preview;
pub mod schema;
pub mod state;
pub mod webhook;

pub use error::CoreError;
pub use preview::{CredentialPreview, PreviewAttribute, CREDENTIAL_PREVIEW_TYPE};
pub use schema::{CredentialSpec, SchemaId, SchemaRegistry};
pub use state::{ConnectionState, CredentialExchangeState, ProofExchangeState};
pub use webhook::{
    BasicMessageEvent, ConnectionEvent, CredentialExchangeEvent, ProofExchangeEvent, WebhookTopic,
};
