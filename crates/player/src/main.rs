//! StreamTorrent Player - command-line provisioning client.
//!
//! Submits a content locator, follows provisioning progress and prints the
//! manifest URI once the stream is ready. The session is deleted on exit.

use std::sync::Arc;

use anyhow::Context;
use streamtorrent_domain::display::{format_size, format_throughput};
use streamtorrent_domain::{ContentLocator, ProvisioningState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamtorrent_player::application::{ProvisioningApi, ProvisioningPoller};
use streamtorrent_player::config::PlayerConfig;
use streamtorrent_player::infrastructure::platform::create_platform;
use streamtorrent_player::infrastructure::{HttpApiClient, TracingNotifier};
use streamtorrent_player::ports::outbound::ProvisioningApiPort;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streamtorrent_player=debug,streamtorrent_domain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let input = std::env::args()
        .nth(1)
        .context("usage: streamtorrent-player <magnet link | info hash | reference>")?;
    let locator = ContentLocator::parse(&input)?;

    let config = PlayerConfig::from_env();
    tracing::info!(api = %config.api_base_url, "Starting StreamTorrent Player");

    let raw_api = Arc::new(HttpApiClient::new(
        &config.api_base_url,
        config.poll.request_timeout,
    ));
    let api: Arc<dyn ProvisioningApiPort> = Arc::new(ProvisioningApi::new(raw_api));

    let id = api
        .create_session(&locator)
        .await
        .context("failed to create stream session")?;
    tracing::info!(session_id = %id, "Stream session created");

    let poller = ProvisioningPoller::spawn(
        Arc::clone(&api),
        create_platform(),
        Arc::new(TracingNotifier),
        config.poll.clone(),
        id.clone(),
    );
    let mut updates = poller.subscribe();
    let mut announced = false;

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break Ok(());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    // poll loop finished
                    break Ok(());
                }
                let view = updates.borrow_and_update().clone();
                match view.state {
                    ProvisioningState::Ready if !announced => {
                        if let Some(uri) = &view.manifest_uri {
                            println!("{uri}");
                            announced = true;
                        }
                        if !config.poll.continue_after_ready {
                            break Ok(());
                        }
                    }
                    ProvisioningState::Ready => {
                        tracing::info!(
                            peers = view.peer_count,
                            speed = %format_throughput(view.throughput_mbps),
                            downloaded = %format_size(view.transferred_mb),
                            "Streaming"
                        );
                    }
                    ProvisioningState::Error => {
                        let message = view
                            .error_message
                            .unwrap_or_else(|| "provisioning failed".to_string());
                        break Err(anyhow::anyhow!(message));
                    }
                    _ => {}
                }
            }
        }
    };

    poller.stop().await;
    if let Err(e) = api.delete_session(&id).await {
        tracing::warn!(session_id = %id, error = %e, "Failed to delete stream session");
    }
    outcome
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
