use thiserror::Error;

/// Errors returned by the admin-API client.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The request never completed: refused connection, reset, timeout.
    #[error("admin API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The agent answered, but with a non-success status.
    #[error("admin API returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    /// The agent answered with a body that does not match the expected shape.
    #[error("unexpected admin API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AdminError {
    /// True when the call itself failed rather than the decoding of its
    /// result. Best-effort operations treat these as survivable: the
    /// exchange record on the agent side is unchanged or retried later.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}
