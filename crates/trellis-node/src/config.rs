//! Controller configuration loading and management.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use trellis_exchange::CredentialPlan;

/// Full configuration for the Trellis controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrellisConfig {
    /// The agent this controller drives.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Webhook listener settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Revocation settings.
    #[serde(default)]
    pub revocation: RevocationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Credential definitions to register at startup.
    #[serde(default = "default_credentials")]
    pub credentials: Vec<CredentialConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the agent's admin API.
    #[serde(default = "default_admin_url")]
    pub admin_url: String,
    /// Admin API key, sent as `x-api-key` when set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Label for this controller in logs and messages.
    #[serde(default = "default_label")]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook listen address.
    #[serde(default = "default_webhook_addr")]
    pub listen_addr: String,
    /// Webhook listen port.
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationConfig {
    /// Whether credential definitions support revocation.
    #[serde(default)]
    pub enabled: bool,
    /// Capacity of each revocation registry.
    #[serde(default = "default_registry_size")]
    pub registry_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// One credential definition: the schema to register and the sample
/// values the menu offers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub name: String,
    pub version: String,
    /// Ordered attribute names of the schema.
    pub attributes: Vec<String>,
    /// Sample issuance values by attribute name; attributes without a
    /// sample are issued with an empty value.
    #[serde(default)]
    pub samples: BTreeMap<String, String>,
}

impl CredentialConfig {
    /// Issuance values for every attribute, in schema order.
    pub fn sample_values(&self) -> Vec<(String, String)> {
        self.attributes
            .iter()
            .map(|name| {
                let value = self.samples.get(name).cloned().unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    }
}

// Default value functions
fn default_admin_url() -> String {
    "http://127.0.0.1:8021".into()
}
fn default_label() -> String {
    "Trellis".into()
}
fn default_webhook_addr() -> String {
    "0.0.0.0".into()
}
fn default_webhook_port() -> u16 {
    8022
}
fn default_registry_size() -> u32 {
    20
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

fn default_credentials() -> Vec<CredentialConfig> {
    let attributes = [
        "position",
        "employer",
        "city",
        "country",
        "periodFrom",
        "periodTo",
        "ongoing",
        "activities",
        "website",
    ];
    let samples = [
        ("position", "Pos"),
        ("employer", "Test"),
        ("city", "A"),
        ("country", "B"),
        ("periodFrom", "12345"),
        ("periodTo", "20000"),
        ("ongoing", "0"),
        ("activities", ""),
        ("website", ""),
    ];
    vec![CredentialConfig {
        name: "work_experience".into(),
        version: "1.1.1".into(),
        attributes: attributes.iter().map(|s| s.to_string()).collect(),
        samples: samples
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }]
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            webhook: WebhookConfig::default(),
            revocation: RevocationConfig::default(),
            logging: LoggingConfig::default(),
            credentials: default_credentials(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            admin_url: default_admin_url(),
            api_key: None,
            label: default_label(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_webhook_addr(),
            port: default_webhook_port(),
        }
    }
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            registry_size: default_registry_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TrellisConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: TrellisConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The webhook bind address as `host:port`.
    pub fn webhook_addr(&self) -> String {
        format!("{}:{}", self.webhook.listen_addr, self.webhook.port)
    }

    /// The registrations to perform at startup.
    pub fn credential_plans(&self) -> Vec<CredentialPlan> {
        self.credentials
            .iter()
            .map(|credential| CredentialPlan {
                name: credential.name.clone(),
                version: credential.version.clone(),
                attributes: credential.attributes.clone(),
            })
            .collect()
    }
}
