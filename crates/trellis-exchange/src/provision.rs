//! Startup provisioning.
//!
//! Before the controller can do anything useful the agent must be
//! answering, hold a public DID, and know about our schemas. All of
//! that is settled once at startup; any failure here aborts the run.

use std::time::Duration;

use futures::future::try_join_all;

use trellis_admin::{AdminClient, Invitation, SchemaDefinition};
use trellis_core::{CredentialSpec, SchemaRegistry};

use crate::error::ExchangeError;

/// Default bounds for the startup status poll.
pub const STATUS_ATTEMPTS: u32 = 30;
pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// One credential definition to register at startup.
#[derive(Debug, Clone)]
pub struct CredentialPlan {
    pub name: String,
    pub version: String,
    pub attributes: Vec<String>,
}

/// Everything startup provisioning produced.
#[derive(Debug)]
pub struct Provisioned {
    /// The agent's public DID; every schema and restriction hangs off it.
    pub issuer_did: String,
    /// Registered credential definitions, sealed for the run.
    pub registry: SchemaRegistry,
    /// The invitation for the peer, with its tracked connection id.
    pub invitation: Invitation,
}

/// Run the full startup sequence: wait for the agent, resolve its
/// public DID, register every planned credential definition (with an
/// initial revocation registry when revocation is on), and create the
/// connection invitation.
pub async fn provision(
    admin: &AdminClient,
    plans: &[CredentialPlan],
    support_revocation: bool,
    registry_size: u32,
    poll_attempts: u32,
    poll_interval: Duration,
) -> Result<Provisioned, ExchangeError> {
    admin.wait_until_ready(poll_attempts, poll_interval).await?;

    let issuer_did = admin
        .public_did()
        .await?
        .ok_or(ExchangeError::NoPublicDid)?;
    tracing::info!(did = %issuer_did, "agent public DID resolved");

    let specs = try_join_all(
        plans
            .iter()
            .map(|plan| register(admin, plan, support_revocation, registry_size)),
    )
    .await?;
    let registry = SchemaRegistry::new(specs)?;

    let invitation = admin.create_invitation().await?;
    tracing::info!(
        connection_id = %invitation.connection_id,
        "connection invitation created"
    );

    Ok(Provisioned {
        issuer_did,
        registry,
        invitation,
    })
}

async fn register(
    admin: &AdminClient,
    plan: &CredentialPlan,
    support_revocation: bool,
    registry_size: u32,
) -> Result<CredentialSpec, ExchangeError> {
    let schema_id = admin
        .register_schema(&SchemaDefinition {
            schema_name: plan.name.clone(),
            schema_version: plan.version.clone(),
            attributes: plan.attributes.clone(),
        })
        .await?;
    let credential_definition_id = admin
        .register_credential_definition(&schema_id, support_revocation)
        .await?;
    tracing::info!(
        schema_id = %schema_id,
        credential_definition_id = %credential_definition_id,
        "credential definition registered"
    );
    if support_revocation {
        admin
            .create_revocation_registry(&credential_definition_id, registry_size)
            .await?;
        tracing::info!(
            credential_definition_id = %credential_definition_id,
            size = registry_size,
            "initial revocation registry created"
        );
    }
    Ok(CredentialSpec {
        name: plan.name.clone(),
        version: plan.version.clone(),
        attributes: plan.attributes.clone(),
        schema_id: schema_id.parse()?,
        credential_definition_id,
    })
}
