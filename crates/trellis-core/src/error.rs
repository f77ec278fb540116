/// Core type errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid schema id '{id}': {reason}")]
    InvalidSchemaId { id: String, reason: String },

    #[error("unknown webhook topic: {0}")]
    UnknownTopic(String),

    #[error("no credential registered under name '{0}'")]
    UnknownCredential(String),

    #[error("no credential registered for definition id '{0}'")]
    UnknownCredentialDefinition(String),

    #[error("credential '{0}' must declare at least one attribute")]
    EmptyAttributes(String),

    #[error("duplicate credential name '{0}' in registry")]
    DuplicateCredential(String),

    #[error("credential '{credential}' is missing a value for attribute '{attribute}'")]
    MissingAttribute {
        credential: String,
        attribute: String,
    },

    #[error("credential '{credential}' has no registered attribute '{attribute}'")]
    UnknownAttribute {
        credential: String,
        attribute: String,
    },
}
