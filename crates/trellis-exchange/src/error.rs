use thiserror::Error;

use trellis_admin::AdminError;
use trellis_core::CoreError;

/// Errors raised while tracking exchanges or executing commands.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    /// A command needed the peer connection before it became active.
    #[error("connection is not ready yet")]
    NotConnected,

    /// The agent has no public DID, so nothing can be anchored to it.
    #[error("agent wallet has no public DID")]
    NoPublicDid,

    /// A revocation command was invoked while revocation support is off.
    #[error("revocation support is disabled")]
    RevocationDisabled,

    /// Revoking needs both the registry id and the credential
    /// revocation id.
    #[error("revocation registry id and credential revocation id are both required")]
    MissingRevocationHandle,

    /// A proof request with no referents would be accepted by the
    /// agent but can never be satisfied meaningfully.
    #[error("proof request needs at least one attribute or predicate")]
    EmptyProofPlan,

    /// A request arrived for a credential definition we never offered
    /// values for, so there is nothing to issue from.
    #[error("no attribute values remembered for credential definition {0}")]
    NoRememberedValues(String),
}

impl ExchangeError {
    /// True when the underlying failure was the admin call itself.
    /// Webhook-driven reactions log these and move on.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Admin(err) if err.is_transport())
    }
}
