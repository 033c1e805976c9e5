//! Entropy client
//!
//! Fetches refreshes from an entropy service on behalf of a draw session. Every
//! failure here is non-fatal: a refused connection, a rejected token or a garbled
//! reply leaves the session drawing with its local weights.

use super::protocol::{read_frame, write_frame, RefreshRequest, RefreshResponse};
use super::{Refresh, RefreshSender};
use crate::config::EntropyConfig;
use crate::whitelist::Whitelist;
use anyhow::{Context, Result};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Connection settings for one entropy service
#[derive(Debug, Clone)]
pub struct EntropyClient {
    address: String,
    auth_token: String,
    universe: usize,
}

impl EntropyClient {
    pub fn new(address: impl Into<String>, auth_token: impl Into<String>, universe: usize) -> Self {
        Self {
            address: address.into(),
            auth_token: auth_token.into(),
            universe,
        }
    }

    pub fn from_config(config: &EntropyConfig, universe: usize) -> Self {
        Self::new(config.address.clone(), config.auth_token.clone(), universe)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Perform one request/response exchange
    ///
    /// Returns `Ok(None)` when the service declines the request.
    pub async fn fetch(&self, whitelist: &Whitelist) -> Result<Option<Refresh>> {
        let mut stream = TcpStream::connect(&self.address)
            .await
            .with_context(|| format!("Failed to connect to entropy service at {}", self.address))?;

        let request = RefreshRequest {
            auth_token: self.auth_token.clone(),
            whitelist: whitelist.clone(),
        };
        write_frame(&mut stream, &request.encode()).await?;

        let body = read_frame(&mut stream).await?;
        let response = RefreshResponse::decode(&body).context("Invalid entropy response")?;
        if let RefreshResponse::Rejected(rejection) = &response {
            debug!("Entropy service declined request: {}", rejection);
        }

        response
            .into_refresh(self.universe)
            .context("Entropy response does not fit this universe")
    }

    /// Fetch in the background and forward any refresh to `sender`
    ///
    /// The task is never awaited by the session; failures are logged and dropped.
    pub fn spawn_refresh(&self, whitelist: Whitelist, sender: RefreshSender) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            match client.fetch(&whitelist).await {
                Ok(Some(refresh)) => {
                    if sender.send(refresh).is_err() {
                        debug!("Draw session closed before refresh arrived");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Entropy refresh failed: {:#}", e),
            }
        })
    }
}
