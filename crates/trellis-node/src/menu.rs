//! Interactive operator menu.
//!
//! A thin loop over stdin: each option maps to one controller
//! command. Errors are printed and the loop continues; only EOF or
//! the exit option ends it.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use trellis_exchange::{Controller, ProofPlan, ProofPredicate};

use crate::config::CredentialConfig;

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

async fn prompt(lines: &mut StdinLines, text: &str) -> anyhow::Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

/// Default proof request for a configured credential: the first two
/// attributes are revealed, and the first remaining attribute with a
/// numeric sample value becomes a `>=` predicate.
fn proof_plan_for(credential: &CredentialConfig) -> ProofPlan {
    let revealed: Vec<String> = credential.attributes.iter().take(2).cloned().collect();
    let predicates = credential
        .attributes
        .iter()
        .filter(|name| !revealed.contains(*name))
        .find_map(|name| {
            credential
                .samples
                .get(name)
                .and_then(|value| value.parse::<i64>().ok())
                .map(|value| ProofPredicate::at_least(name.clone(), value))
        })
        .into_iter()
        .collect();
    ProofPlan {
        name: format!("Proof of {}", credential.name),
        version: "1.0".to_string(),
        revealed,
        predicates,
    }
}

pub struct Menu {
    controller: Arc<Controller>,
    credentials: Vec<CredentialConfig>,
}

impl Menu {
    pub fn new(controller: Arc<Controller>, credentials: Vec<CredentialConfig>) -> Self {
        Self {
            controller,
            credentials,
        }
    }

    fn options_line(&self) -> String {
        let mut line =
            String::from("(1) Issue Credential (2) Send Proof Request (3) Send Message ");
        if self.controller.revocation_enabled() {
            line.push_str(
                "(4) Revoke Credential (5) Publish Revocations (6) Add Revocation Registry ",
            );
        }
        line.push_str("(T) Toggle tracing (X) Exit");
        line
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{}", self.options_line());
        loop {
            let Some(choice) = prompt(&mut lines, "> ").await? else {
                break;
            };
            match choice.as_str() {
                "" => continue,
                "x" | "X" => break,
                "t" | "T" => {
                    let on = self.controller.toggle_tracing();
                    println!(
                        ">>> Credential/Proof exchange tracing is {}",
                        if on { "ON" } else { "OFF" }
                    );
                }
                "1" => self.issue_credential().await,
                "2" => self.request_proof().await,
                "3" => self.send_message(&mut lines).await?,
                "4" => self.revoke_credential(&mut lines).await?,
                "5" => self.publish_revocations().await,
                "6" => self.add_revocation_registry().await,
                other => {
                    println!("Unknown option: {other}");
                    println!("{}", self.options_line());
                }
            }
        }
        Ok(())
    }

    async fn issue_credential(&self) {
        let Some(credential) = self.credentials.first() else {
            println!("No credentials are configured.");
            return;
        };
        match self
            .controller
            .issue_credential(&credential.name, &credential.sample_values())
            .await
        {
            Ok(()) => println!("Credential offer for '{}' is on its way.", credential.name),
            Err(err) => println!("Could not issue credential: {err}"),
        }
    }

    async fn request_proof(&self) {
        let Some(credential) = self.credentials.first() else {
            println!("No credentials are configured.");
            return;
        };
        let plan = proof_plan_for(credential);
        match self.controller.request_proof(&plan).await {
            Ok(()) => println!("Proof request '{}' sent.", plan.name),
            Err(err) => println!("Could not request proof: {err}"),
        }
    }

    async fn send_message(&self, lines: &mut StdinLines) -> anyhow::Result<()> {
        let Some(message) = prompt(lines, "Enter message: ").await? else {
            return Ok(());
        };
        if message.is_empty() {
            return Ok(());
        }
        match self.controller.send_message(&message).await {
            Ok(()) => println!("Sent."),
            Err(err) => println!("Could not send message: {err}"),
        }
        Ok(())
    }

    async fn revoke_credential(&self, lines: &mut StdinLines) -> anyhow::Result<()> {
        let issued = self.controller.revocations().issued();
        if !issued.is_empty() {
            println!("Known revocable credentials:");
            for (exchange_id, handle) in issued {
                println!(
                    "  {exchange_id}: rev_reg_id={} cred_rev_id={}",
                    handle.rev_reg_id, handle.cred_rev_id
                );
            }
        }
        let Some(rev_reg_id) = prompt(lines, "Enter revocation registry id: ").await? else {
            return Ok(());
        };
        let Some(cred_rev_id) = prompt(lines, "Enter credential revocation id: ").await? else {
            return Ok(());
        };
        let Some(publish) = prompt(lines, "Publish now? [y/N]: ").await? else {
            return Ok(());
        };
        let publish = matches!(publish.as_str(), "y" | "Y" | "yes");
        match self
            .controller
            .revoke_credential(&rev_reg_id, &cred_rev_id, publish)
            .await
        {
            Ok(()) if publish => println!("Revocation sent."),
            Ok(()) => println!("Revocation staged; publish it with option 5."),
            Err(err) => println!("Could not revoke: {err}"),
        }
        Ok(())
    }

    async fn publish_revocations(&self) {
        let staged = self.controller.revocations().pending();
        if !staged.is_empty() {
            println!("Publishing {} staged revocation(s):", staged.len());
            for handle in &staged {
                println!(
                    "  rev_reg_id={} cred_rev_id={}",
                    handle.rev_reg_id, handle.cred_rev_id
                );
            }
        }
        match self.controller.publish_revocations().await {
            Ok(published) if published.is_empty() => println!("Nothing was published."),
            Ok(published) => {
                println!(
                    "Published {} credential revocation(s) in {} registries:",
                    published.credential_count(),
                    published.rrid2crid.len()
                );
                for (registry, ids) in &published.rrid2crid {
                    println!("  {registry}: {}", ids.join(", "));
                }
            }
            Err(err) => println!("Could not publish revocations: {err}"),
        }
    }

    async fn add_revocation_registry(&self) {
        let Some(credential) = self.credentials.first() else {
            println!("No credentials are configured.");
            return;
        };
        match self
            .controller
            .add_revocation_registry(&credential.name)
            .await
        {
            Ok(()) => println!(
                "Requested a new revocation registry for '{}'.",
                credential.name
            ),
            Err(err) => println!("Could not add a revocation registry: {err}"),
        }
    }
}
