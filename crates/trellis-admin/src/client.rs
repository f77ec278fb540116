use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use trellis_core::CredentialPreview;

use crate::error::AdminError;
use crate::types::{
    CredentialProposal, Invitation, IssueOutcome, PresentationVerdict, ProofRequestEnvelope,
    PublishedRevocations, SchemaDefinition,
};

/// HTTP client for an agent's admin API.
///
/// Paths are rooted at the admin base URL; when an API key is
/// configured it is attached to every request as `x-api-key`.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }

    async fn send(&self, req: RequestBuilder, path: &str) -> Result<Value, AdminError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AdminError::Status {
                status: status.as_u16(),
                path: path.to_string(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// `GET` a path and return the raw JSON body.
    pub async fn get(&self, path: &str) -> Result<Value, AdminError> {
        self.send(self.request(Method::GET, path), path).await
    }

    /// `POST` a JSON body to a path and return the raw JSON response.
    pub async fn post<T>(&self, path: &str, body: &T) -> Result<Value, AdminError>
    where
        T: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body), path)
            .await
    }

    /// `POST` with no body, for endpoints that act on the path alone.
    pub async fn post_empty(&self, path: &str) -> Result<Value, AdminError> {
        self.send(self.request(Method::POST, path), path).await
    }

    /// `GET /status`, the agent liveness probe.
    pub async fn status(&self) -> Result<Value, AdminError> {
        self.get("/status").await
    }

    /// Poll `GET /status` until the agent answers, retrying transport
    /// failures up to `attempts` times with `delay` between polls.
    pub async fn wait_until_ready(
        &self,
        attempts: u32,
        delay: Duration,
    ) -> Result<(), AdminError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.status().await {
                Ok(_) => {
                    tracing::info!(base_url = %self.base_url, "agent admin API is up");
                    return Ok(());
                }
                Err(err) if err.is_transport() && attempt < attempts => {
                    tracing::debug!(
                        attempt,
                        error = %err,
                        "agent not answering yet, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// `GET /wallet/did/public`. Returns `None` when the wallet has no
    /// public DID yet.
    pub async fn public_did(&self) -> Result<Option<String>, AdminError> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            result: Option<PublicDid>,
        }
        #[derive(Deserialize)]
        struct PublicDid {
            did: String,
        }

        let body = self.get("/wallet/did/public").await?;
        let envelope: Envelope = serde_json::from_value(body)?;
        Ok(envelope.result.map(|did| did.did))
    }

    /// `POST /schemas`. Returns the ledger schema id.
    pub async fn register_schema(
        &self,
        definition: &SchemaDefinition,
    ) -> Result<String, AdminError> {
        #[derive(Deserialize)]
        struct Created {
            schema_id: String,
        }

        let body = self.post("/schemas", definition).await?;
        let created: Created = serde_json::from_value(body)?;
        Ok(created.schema_id)
    }

    /// `POST /credential-definitions`. Returns the credential
    /// definition id.
    pub async fn register_credential_definition(
        &self,
        schema_id: &str,
        support_revocation: bool,
    ) -> Result<String, AdminError> {
        #[derive(Deserialize)]
        struct Created {
            credential_definition_id: String,
        }

        let body = self
            .post(
                "/credential-definitions",
                &json!({
                    "schema_id": schema_id,
                    "support_revocation": support_revocation,
                }),
            )
            .await?;
        let created: Created = serde_json::from_value(body)?;
        Ok(created.credential_definition_id)
    }

    /// `POST /connections/create-invitation`.
    pub async fn create_invitation(&self) -> Result<Invitation, AdminError> {
        let body = self.post_empty("/connections/create-invitation").await?;
        Ok(serde_json::from_value(body)?)
    }

    /// `POST /connections/{id}/send-message`.
    pub async fn send_message(
        &self,
        connection_id: &str,
        content: &str,
    ) -> Result<(), AdminError> {
        self.post(
            &format!("/connections/{connection_id}/send-message"),
            &json!({ "content": content }),
        )
        .await?;
        Ok(())
    }

    /// `POST /issue-credential/send`: start an exchange from a full
    /// proposal.
    pub async fn propose_credential(
        &self,
        proposal: &CredentialProposal,
    ) -> Result<Value, AdminError> {
        self.post("/issue-credential/send", proposal).await
    }

    /// `POST /issue-credential/records/{id}/send-request`: accept a
    /// received offer.
    pub async fn send_credential_request(
        &self,
        credential_exchange_id: &str,
    ) -> Result<Value, AdminError> {
        self.post_empty(&format!(
            "/issue-credential/records/{credential_exchange_id}/send-request"
        ))
        .await
    }

    /// `POST /issue-credential/records/{id}/issue`: answer a received
    /// request with the credential itself.
    pub async fn issue_credential(
        &self,
        credential_exchange_id: &str,
        comment: &str,
        preview: &CredentialPreview,
    ) -> Result<IssueOutcome, AdminError> {
        let body = self
            .post(
                &format!("/issue-credential/records/{credential_exchange_id}/issue"),
                &json!({
                    "comment": comment,
                    "credential_preview": preview,
                }),
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// `GET /credential/{id}`: a credential stored in the wallet.
    pub async fn stored_credential(&self, credential_id: &str) -> Result<Value, AdminError> {
        self.get(&format!("/credential/{credential_id}")).await
    }

    /// `POST /present-proof/send-request`.
    pub async fn send_proof_request(
        &self,
        request: &ProofRequestEnvelope,
    ) -> Result<Value, AdminError> {
        self.post("/present-proof/send-request", request).await
    }

    /// `POST /present-proof/records/{id}/verify-presentation`.
    pub async fn verify_presentation(
        &self,
        presentation_exchange_id: &str,
    ) -> Result<PresentationVerdict, AdminError> {
        let body = self
            .post_empty(&format!(
                "/present-proof/records/{presentation_exchange_id}/verify-presentation"
            ))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// `POST /issue-credential/revoke`. With `publish` false the
    /// revocation is only staged; a later publish pushes it out.
    pub async fn revoke_credential(
        &self,
        rev_reg_id: &str,
        cred_rev_id: &str,
        publish: bool,
    ) -> Result<(), AdminError> {
        let path = "/issue-credential/revoke";
        let req = self.request(Method::POST, path).query(&[
            ("rev_reg_id", rev_reg_id.to_string()),
            ("cred_rev_id", cred_rev_id.to_string()),
            ("publish", publish.to_string()),
        ]);
        self.send(req, path).await?;
        Ok(())
    }

    /// `POST /issue-credential/publish-revocations`: push all staged
    /// revocations to the ledger.
    pub async fn publish_revocations(&self) -> Result<PublishedRevocations, AdminError> {
        let body = self
            .post("/issue-credential/publish-revocations", &json!({}))
            .await?;
        if body.is_null() {
            return Ok(PublishedRevocations::default());
        }
        Ok(serde_json::from_value(body)?)
    }

    /// `POST /revocation/create-registry`.
    pub async fn create_revocation_registry(
        &self,
        credential_definition_id: &str,
        max_cred_num: u32,
    ) -> Result<Value, AdminError> {
        self.post(
            "/revocation/create-registry",
            &json!({
                "credential_definition_id": credential_definition_id,
                "max_cred_num": max_cred_num,
            }),
        )
        .await
    }
}
