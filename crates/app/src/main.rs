//! Atrium console client - smoke binary
//!
//! Signs in against the configured backend and tails the integration
//! status stream to stdout. Useful for checking a deployment end to end
//! without the console UI.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use atrium_domain::{ClientConfig, SignInRequest, StreamEvent};
use atrium_infrastructure::{ApiClient, FileCredentialStore, StatusSubscription};

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn config_from_env() -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let api_base_url = env("ATRIUM_API_URL").ok_or("ATRIUM_API_URL is not set")?;
    let events_url = env("ATRIUM_EVENTS_URL")
        .unwrap_or_else(|| format!("{}/integrations/events", api_base_url.trim_end_matches('/')));

    let mut config = ClientConfig::new(api_base_url).with_events_url(events_url);
    if let Some(socket_url) = env("ATRIUM_CHAT_URL") {
        config = config.with_chat_socket_url(socket_url);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = config_from_env()?;
    let store = Arc::new(FileCredentialStore::default_location()?);
    let client = ApiClient::new(&config, store)?;

    if let (Some(email), Some(password)) = (env("ATRIUM_EMAIL"), env("ATRIUM_PASSWORD")) {
        let session = client.sign_in(&SignInRequest { email, password }).await?;
        info!(user = %session.user.email, "signed in");
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = StatusSubscription::open(&config, client.access_token().await, tx).await?;

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Batch(batch) => {
                for status in batch {
                    println!(
                        "{:<20} {:<12} {}",
                        status.integration,
                        format!("{:?}", status.state).to_lowercase(),
                        status.detail.unwrap_or_default()
                    );
                }
            }
            StreamEvent::Error(e) => {
                error!(error = %e, "status stream ended");
                break;
            }
        }
    }

    subscription.close();
    Ok(())
}
