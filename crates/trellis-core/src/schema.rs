use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Marker segment identifying a schema object in a ledger identifier.
const SCHEMA_MARKER: &str = "2";

/// Fully-qualified ledger schema identifier,
/// `<issuer did>:2:<name>:<version>`.
///
/// Parsed and validated once; components are read through accessors
/// instead of re-splitting the string at every use site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaId {
    issuer_did: String,
    name: String,
    version: String,
}

impl SchemaId {
    /// DID of the schema's publisher.
    pub fn issuer_did(&self) -> &str {
        &self.issuer_did
    }

    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl FromStr for SchemaId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(CoreError::InvalidSchemaId {
                id: s.to_string(),
                reason: "expected 4 colon-separated segments".into(),
            });
        }
        if parts[1] != SCHEMA_MARKER {
            return Err(CoreError::InvalidSchemaId {
                id: s.to_string(),
                reason: format!("marker segment must be '{}'", SCHEMA_MARKER),
            });
        }
        if parts[0].is_empty() || parts[2].is_empty() || parts[3].is_empty() {
            return Err(CoreError::InvalidSchemaId {
                id: s.to_string(),
                reason: "issuer DID, name, and version must be non-empty".into(),
            });
        }
        Ok(Self {
            issuer_did: parts[0].to_string(),
            name: parts[2].to_string(),
            version: parts[3].to_string(),
        })
    }
}

impl TryFrom<String> for SchemaId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaId> for String {
    fn from(id: SchemaId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.issuer_did, SCHEMA_MARKER, self.name, self.version
        )
    }
}

/// A provisioned credential type: the registered schema plus the
/// credential definition derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSpec {
    /// Logical credential name used by operator commands.
    pub name: String,
    /// Schema version.
    pub version: String,
    /// Attribute names in their registered order.
    pub attributes: Vec<String>,
    /// Ledger schema identifier.
    pub schema_id: SchemaId,
    /// Ledger credential-definition identifier.
    pub credential_definition_id: String,
}

/// Registry of provisioned credential types.
///
/// Built once during startup provisioning and read-only afterwards, so
/// no synchronization is needed around it.
#[derive(Debug)]
pub struct SchemaRegistry {
    by_name: HashMap<String, CredentialSpec>,
    cred_def_to_name: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Build a registry from provisioned specs.
    ///
    /// Rejects duplicate logical names and specs without attributes.
    pub fn new(specs: impl IntoIterator<Item = CredentialSpec>) -> Result<Self, CoreError> {
        let mut by_name = HashMap::new();
        let mut cred_def_to_name = HashMap::new();
        for spec in specs {
            if spec.attributes.is_empty() {
                return Err(CoreError::EmptyAttributes(spec.name));
            }
            if by_name.contains_key(&spec.name) {
                return Err(CoreError::DuplicateCredential(spec.name));
            }
            cred_def_to_name.insert(spec.credential_definition_id.clone(), spec.name.clone());
            by_name.insert(spec.name.clone(), spec);
        }
        Ok(Self {
            by_name,
            cred_def_to_name,
        })
    }

    /// Look up a spec by logical credential name.
    pub fn get(&self, name: &str) -> Result<&CredentialSpec, CoreError> {
        self.by_name
            .get(name)
            .ok_or_else(|| CoreError::UnknownCredential(name.to_string()))
    }

    /// Look up a spec by credential-definition id, as webhook events
    /// report exchanges.
    pub fn by_credential_definition(&self, cred_def_id: &str) -> Result<&CredentialSpec, CoreError> {
        self.cred_def_to_name
            .get(cred_def_id)
            .and_then(|name| self.by_name.get(name))
            .ok_or_else(|| CoreError::UnknownCredentialDefinition(cred_def_id.to_string()))
    }

    /// Registered logical names.
    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    /// Number of registered credential types.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the registry holds no credential types.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
