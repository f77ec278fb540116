use std::fmt;

/// States a connection reports on the `connections` webhook topic.
///
/// Wire labels follow the agent's connection record; the historical
/// past-tense spellings are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Invitation created, nothing received from the other party yet.
    Invitation,
    /// Connection request received or sent.
    Request,
    /// Connection response exchanged.
    Response,
    /// Connection is usable. Terminal state.
    Active,
    /// Any state this controller does not react to, kept verbatim.
    Other(String),
}

impl ConnectionState {
    /// Parse a wire label. Never fails; unrecognized labels are preserved.
    pub fn from_label(label: &str) -> Self {
        match label {
            "invitation" | "invited" => Self::Invitation,
            "request" | "requested" => Self::Request,
            "response" | "responded" => Self::Response,
            "active" => Self::Active,
            other => Self::Other(other.to_string()),
        }
    }

    /// The canonical wire label.
    pub fn label(&self) -> &str {
        match self {
            Self::Invitation => "invitation",
            Self::Request => "request",
            Self::Response => "response",
            Self::Active => "active",
            Self::Other(s) => s,
        }
    }

    /// Whether this state marks the connection usable for exchanges.
    ///
    /// Agents may settle into `active` without a final webhook after
    /// `response`, so both count.
    pub fn signals_ready(&self) -> bool {
        matches!(self, Self::Active | Self::Response)
    }

    /// Whether this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// States of a credential-issuance exchange as reported on the
/// `issue_credential` topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CredentialExchangeState {
    ProposalSent,
    ProposalReceived,
    OfferSent,
    /// Holder side: an offer arrived and a request should be sent back.
    OfferReceived,
    RequestSent,
    /// Issuer side: a request arrived and the credential should be issued.
    RequestReceived,
    CredentialIssued,
    CredentialReceived,
    /// The credential is stored and acknowledged. Terminal state.
    CredentialAcked,
    /// Any state this controller does not react to, kept verbatim.
    Other(String),
}

impl CredentialExchangeState {
    /// Parse a wire label. Never fails; unrecognized labels are preserved.
    pub fn from_label(label: &str) -> Self {
        match label {
            "proposal_sent" => Self::ProposalSent,
            "proposal_received" => Self::ProposalReceived,
            "offer_sent" => Self::OfferSent,
            "offer_received" => Self::OfferReceived,
            "request_sent" => Self::RequestSent,
            "request_received" => Self::RequestReceived,
            "credential_issued" => Self::CredentialIssued,
            "credential_received" => Self::CredentialReceived,
            "credential_acked" => Self::CredentialAcked,
            other => Self::Other(other.to_string()),
        }
    }

    /// The canonical wire label.
    pub fn label(&self) -> &str {
        match self {
            Self::ProposalSent => "proposal_sent",
            Self::ProposalReceived => "proposal_received",
            Self::OfferSent => "offer_sent",
            Self::OfferReceived => "offer_received",
            Self::RequestSent => "request_sent",
            Self::RequestReceived => "request_received",
            Self::CredentialIssued => "credential_issued",
            Self::CredentialReceived => "credential_received",
            Self::CredentialAcked => "credential_acked",
            Self::Other(s) => s,
        }
    }

    /// Whether this is a final (terminal) state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CredentialAcked)
    }
}

impl fmt::Display for CredentialExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// States of a proof-presentation exchange as reported on the
/// `present_proof` topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProofExchangeState {
    ProposalSent,
    ProposalReceived,
    RequestSent,
    RequestReceived,
    PresentationSent,
    /// Verifier side: a presentation arrived and should be verified.
    PresentationReceived,
    /// Verification ran; the verdict is in the exchange record. Terminal.
    Verified,
    PresentationAcked,
    /// Any state this controller does not react to, kept verbatim.
    Other(String),
}

impl ProofExchangeState {
    /// Parse a wire label. Never fails; unrecognized labels are preserved.
    pub fn from_label(label: &str) -> Self {
        match label {
            "proposal_sent" => Self::ProposalSent,
            "proposal_received" => Self::ProposalReceived,
            "request_sent" => Self::RequestSent,
            "request_received" => Self::RequestReceived,
            "presentation_sent" => Self::PresentationSent,
            "presentation_received" => Self::PresentationReceived,
            "verified" => Self::Verified,
            "presentation_acked" => Self::PresentationAcked,
            other => Self::Other(other.to_string()),
        }
    }

    /// The canonical wire label.
    pub fn label(&self) -> &str {
        match self {
            Self::ProposalSent => "proposal_sent",
            Self::ProposalReceived => "proposal_received",
            Self::RequestSent => "request_sent",
            Self::RequestReceived => "request_received",
            Self::PresentationSent => "presentation_sent",
            Self::PresentationReceived => "presentation_received",
            Self::Verified => "verified",
            Self::PresentationAcked => "presentation_acked",
            Self::Other(s) => s,
        }
    }

    /// Whether this is a final (terminal) state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for ProofExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
