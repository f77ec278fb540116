//! Credential preview construction.
//!
//! The preview is the ordered attribute list embedded in credential
//! proposals and issue commands. Attribute order always follows the
//! registered schema, regardless of how the caller supplied values.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schema::CredentialSpec;

/// Message `@type` marking a credential preview on the wire.
pub const CREDENTIAL_PREVIEW_TYPE: &str =
    "did:sov:BzCbsNYhMrjHiqZDTUASHg;spec/issue-credential/1.0/credential-preview";

/// One attribute of a credential preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewAttribute {
    pub name: String,
    pub value: String,
}

impl PreviewAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The structured attribute list proposed for issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPreview {
    #[serde(rename = "@type")]
    pub preview_type: String,
    pub attributes: Vec<PreviewAttribute>,
}

impl CredentialPreview {
    /// Wrap already-ordered attributes in a preview envelope.
    pub fn new(attributes: Vec<PreviewAttribute>) -> Self {
        Self {
            preview_type: CREDENTIAL_PREVIEW_TYPE.to_string(),
            attributes,
        }
    }

    /// Build a preview for `spec` from caller-supplied values.
    ///
    /// Every registered attribute must have exactly one value; names not
    /// in the schema are rejected. The result is ordered per the schema,
    /// not per the input.
    pub fn build(spec: &CredentialSpec, values: &[(String, String)]) -> Result<Self, CoreError> {
        for (name, _) in values {
            if !spec.attributes.iter().any(|a| a == name) {
                return Err(CoreError::UnknownAttribute {
                    credential: spec.name.clone(),
                    attribute: name.clone(),
                });
            }
        }

        let mut attributes = Vec::with_capacity(spec.attributes.len());
        for attr in &spec.attributes {
            let value = values
                .iter()
                .find(|(name, _)| name == attr)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| CoreError::MissingAttribute {
                    credential: spec.name.clone(),
                    attribute: attr.clone(),
                })?;
            attributes.push(PreviewAttribute::new(attr.clone(), value));
        }

        Ok(Self::new(attributes))
    }

    /// Attribute names in preview order.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}
