//! Print every change the controller reports.
//!
//! Usage: `cargo run --example watch_updates -- nvr.yaml`
//!
//! The YAML file holds a `ClientConfig`, at minimum `host`, `username` and
//! `password`. Set `RUST_LOG=nvrsync=debug` to see connection activity.

use anyhow::Context;
use futures::StreamExt;
use nvrsync::{ClientConfig, ConnectionState, ModelKind, ProtectClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "nvrsync=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args().nth(1).context("usage: watch_updates <config.yaml>")?;
    let config = ClientConfig::from_path(&path).with_context(|| format!("loading {}", path))?;

    let client = ProtectClient::connect(config).await?;
    {
        let snapshot = client.snapshot();
        println!("Connected to {} ({})", snapshot.nvr().name().unwrap_or("nvr"), client.timezone());
        for camera in snapshot.records(ModelKind::Camera) {
            println!("  camera {:<24} {}", camera.id().unwrap_or("?"), camera.name().unwrap_or(""));
        }
    }

    let mut states = client.state_updates();
    tokio::spawn(async move {
        while let Some(state) = states.next().await {
            if state != ConnectionState::Connected {
                println!("-- connection {:?}", state);
            }
        }
    });

    let mut updates = client.updates();
    while let Some(change) = updates.next().await {
        let fields: Vec<&str> = change.changed_fields().collect();
        println!(
            "{:?} {} {} [{}]",
            change.action,
            change.kind,
            change.id.as_deref().unwrap_or("-"),
            fields.join(", ")
        );
    }

    Ok(())
}
