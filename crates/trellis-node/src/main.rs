//! Trellis controller entry point.
//!
//! Provisions the agent (schemas, credential definitions, invitation),
//! serves the webhook listener, and hands control to the operator menu
//! once the peer connection is active.

mod config;
mod menu;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trellis_admin::{AdminClient, Invitation};
use trellis_exchange::{
    provision, CommandExecutor, Controller, EventDispatcher, STATUS_ATTEMPTS, STATUS_INTERVAL,
};

use config::TrellisConfig;
use menu::Menu;

/// Trellis controller
#[derive(Parser, Debug)]
#[command(
    name = "trellis-node",
    version,
    about = "Webhook-driven controller for an Aries-compatible agent"
)]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "trellis.toml")]
    config: PathBuf,

    /// Override the agent admin API base URL.
    #[arg(long)]
    admin_url: Option<String>,

    /// Override the admin API key.
    #[arg(long)]
    api_key: Option<String>,

    /// Override the webhook listen port.
    #[arg(long)]
    webhook_port: Option<u16>,

    /// Enable revocation support regardless of the config file.
    #[arg(long)]
    revocation: bool,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        let config = TrellisConfig::default();
        config.save(&args.config)?;
        println!("Wrote default config to {}", args.config.display());
        return Ok(());
    }

    // Load configuration and apply CLI overrides
    let mut config = TrellisConfig::load(&args.config)?;
    if let Some(admin_url) = args.admin_url {
        config.agent.admin_url = admin_url;
    }
    if let Some(api_key) = args.api_key {
        config.agent.api_key = Some(api_key);
    }
    if let Some(port) = args.webhook_port {
        config.webhook.port = port;
    }
    if args.revocation {
        config.revocation.enabled = true;
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    run(config).await
}

async fn run(config: TrellisConfig) -> anyhow::Result<()> {
    tracing::info!(
        label = %config.agent.label,
        admin_url = %config.agent.admin_url,
        "Trellis controller v{}",
        env!("CARGO_PKG_VERSION")
    );

    let admin = AdminClient::new(&config.agent.admin_url, config.agent.api_key.clone());
    let provisioned = provision(
        &admin,
        &config.credential_plans(),
        config.revocation.enabled,
        config.revocation.registry_size,
        STATUS_ATTEMPTS,
        STATUS_INTERVAL,
    )
    .await
    .context("startup provisioning failed")?;
    tracing::info!(
        issuer_did = %provisioned.issuer_did,
        credentials = ?provisioned.registry.names(),
        "provisioning complete"
    );

    let executor = CommandExecutor::new(
        admin,
        Arc::new(provisioned.registry),
        &provisioned.issuer_did,
        config.revocation.enabled,
        config.revocation.registry_size,
    );
    let controller = Arc::new(Controller::new(executor));
    controller.bind_connection(&provisioned.invitation.connection_id);
    let dispatcher = Arc::new(EventDispatcher::new(controller.clone()));

    let webhook_addr = config.webhook_addr();
    let listener = tokio::net::TcpListener::bind(&webhook_addr)
        .await
        .with_context(|| format!("could not bind webhook listener on {webhook_addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "webhook listener started");
    tokio::spawn(async move {
        if let Err(err) = webhook::serve(listener, dispatcher).await {
            tracing::error!(error = %err, "webhook listener stopped");
        }
    });

    print_invitation(&provisioned.invitation)?;

    println!("Waiting for the peer to accept the invitation...");
    tokio::select! {
        _ = controller.ready() => {
            match controller.connections().state() {
                Some(state) => tracing::info!(state = %state, "peer connection established"),
                None => tracing::info!("peer connection established"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted before the peer connected");
            return Ok(());
        }
    }

    let menu = Menu::new(controller, config.credentials.clone());
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
        tracing::info!("received shutdown signal");
    };
    tokio::select! {
        result = menu.run() => {
            result?;
        }
        _ = shutdown => {}
    }

    tracing::info!("Trellis controller exited cleanly");
    Ok(())
}

fn print_invitation(invitation: &Invitation) -> anyhow::Result<()> {
    println!("Use the following JSON to accept the invite from another agent,");
    println!("or scan the QR code from a mobile wallet.");
    println!();
    println!("{}", serde_json::to_string_pretty(&invitation.invitation)?);
    println!();
    println!("Invitation URL: {}", invitation.invitation_url);
    match qrcode::QrCode::new(invitation.invitation_url.as_bytes()) {
        Ok(code) => {
            let rendered = code
                .render::<qrcode::render::unicode::Dense1x2>()
                .dark_color(qrcode::render::unicode::Dense1x2::Light)
                .light_color(qrcode::render::unicode::Dense1x2::Dark)
                .build();
            println!("{rendered}");
        }
        Err(err) => tracing::warn!(error = %err, "could not render the invitation QR code"),
    }
    Ok(())
}
