//! Entropy service
//!
//! Answers refresh requests from draw sessions. The service keeps its own weight
//! table (built from the ledger) and its own lookahead buffer, refilled so that no
//! item is queued twice in a row. For every authorized request it hands out the
//! next buffered item that is eligible in the request's whitelist, together with
//! the current weight vector.
//!
//! Connections carry a single exchange and are served one at a time, so the
//! buffer needs no locking.

use super::ledger;
use super::protocol::{read_frame, write_frame, Rejection, RefreshRequest, RefreshResponse};
use crate::config::Config;
use crate::distribution::prefetch::PrefetchBuffer;
use crate::distribution::weights::WeightTable;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Refresh service state
pub struct EntropyService {
    listen_port: u16,
    auth_token: String,
    weights: WeightTable,
    buffer: PrefetchBuffer,
    served: u64,
}

impl EntropyService {
    /// Create the service described by `config`
    ///
    /// Ledger transactions are evaluated against today's local date.
    pub fn new(config: &Config) -> Result<Self> {
        let service = &config.service;
        let today = chrono::Local::now().date_naive();
        let weights = ledger::build_weights(
            config.universe.size,
            service.base_weight,
            &service.transactions,
            today,
        )
        .context("Failed to build service weights")?;

        let rng = match config.sampling.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut this = Self::with_weights(service.auth_token.clone(), weights, service.buffer_depth, rng);
        this.listen_port = service.listen_port;
        Ok(this)
    }

    /// Create a service from explicit parts
    pub fn with_weights(
        auth_token: String,
        weights: WeightTable,
        buffer_depth: usize,
        rng: Xoshiro256PlusPlus,
    ) -> Self {
        let mut buffer = PrefetchBuffer::new(buffer_depth, rng).with_adjacent_repeats_avoided();
        buffer.reserve(&weights);
        Self {
            listen_port: 0,
            auth_token,
            weights,
            buffer,
            served: 0,
        }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Number of refreshes handed out
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Bind the configured port and serve forever
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.listen_port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind entropy service on {}", addr))?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(mut self, listener: TcpListener) -> Result<()> {
        info!(
            "Entropy service listening on {}",
            listener.local_addr().context("Listener has no local address")?
        );

        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .context("Failed to accept connection")?;

            if let Err(e) = self.handle(stream).await {
                warn!("Request from {} failed: {:#}", peer, e);
            }
        }
    }

    async fn handle(&mut self, mut stream: TcpStream) -> Result<()> {
        let body = read_frame(&mut stream).await?;
        let response = self.answer(&body);
        let reply = response
            .encode()
            .context("Failed to encode response")?;
        write_frame(&mut stream, &reply).await
    }

    /// Compute the response to one request body
    pub fn answer(&mut self, body: &str) -> RefreshResponse {
        let request = match RefreshRequest::decode(body, self.weights.universe_size()) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed refresh request: {}", e);
                return RefreshResponse::Rejected(Rejection::Error);
            }
        };

        if request.auth_token != self.auth_token {
            debug!("Refresh request with wrong token");
            return RefreshResponse::Rejected(Rejection::InvalidAuthentication);
        }
        if request.whitelist.count() == 0 {
            return RefreshResponse::Rejected(Rejection::Error);
        }

        // Every weight is positive, so an eligible item turns up eventually
        let item = loop {
            match self.buffer.pop(&self.weights) {
                Some(item) if request.whitelist.contains(item) => break item,
                Some(_) => continue,
                None => return RefreshResponse::Rejected(Rejection::Error),
            }
        };

        self.served += 1;
        debug!(item, served = self.served, "served refresh");
        RefreshResponse::Accepted {
            primed: item - 1,
            weights: self.weights.as_slice().to_vec(),
        }
    }
}
