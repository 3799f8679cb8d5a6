//! Federated search across peer catalogs.
//!
//! # Responsibility
//! - Query every configured peer concurrently with a per-peer deadline.
//! - Aggregate peer hits without deduplication or ranking.
//!
//! # Invariants
//! - One task per peer; the result channel is sized to the peer count.
//! - The fan-out waits for exactly one outcome per peer.
//! - Peer failures contribute zero hits and are only logged; they never
//!   fail the overall query.

use crate::model::peer::Peer;
use crate::search::{PartHit, PartQuery};
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

mod client;

pub use client::{HttpPeerClient, PeerClient, PeerError, FEDERATED_SEARCH_PATH};

/// Default per-peer deadline.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_millis(500);

/// Merges configured and stored peers by name; configured entries win.
///
/// Output is sorted by peer name.
pub fn merge_peers(configured: Vec<Peer>, stored: Vec<Peer>) -> Vec<Peer> {
    let mut by_name = std::collections::BTreeMap::new();
    for peer in stored.into_iter().chain(configured) {
        by_name.insert(peer.name.clone(), peer);
    }
    by_name.into_values().collect()
}

/// Read-only set of peers queried together.
#[derive(Clone)]
pub struct Federation {
    peers: Vec<Arc<dyn PeerClient>>,
    timeout: Duration,
}

impl Federation {
    /// Creates an empty federation with the given per-peer deadline.
    pub fn new(timeout: Duration) -> Self {
        Self {
            peers: Vec::new(),
            timeout,
        }
    }

    /// Builds HTTP clients for every peer.
    pub fn from_peers(
        peers: impl IntoIterator<Item = Peer>,
        timeout: Duration,
    ) -> Result<Self, PeerError> {
        let mut federation = Self::new(timeout);
        for peer in peers {
            federation = federation.with_client(Arc::new(HttpPeerClient::new(peer, timeout)?));
        }
        Ok(federation)
    }

    pub fn with_client(mut self, client: Arc<dyn PeerClient>) -> Self {
        self.peers.push(client);
        self
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Queries every peer and returns all hits that arrived in time.
    ///
    /// Must run inside a tokio runtime.
    pub async fn fan_out(&self, query: &PartQuery) -> Vec<PartHit> {
        if self.peers.is_empty() {
            return Vec::new();
        }

        let started_at = Instant::now();
        info!(
            "event=federated_search module=federation status=start peer_count={}",
            self.peers.len()
        );

        let (tx, mut rx) = mpsc::channel(self.peers.len());
        for client in &self.peers {
            let client = Arc::clone(client);
            let query = query.clone();
            let tx = tx.clone();
            let deadline = self.timeout;
            tokio::spawn(async move {
                let outcome = match tokio::time::timeout(deadline, client.search(&query)).await {
                    Ok(result) => result,
                    Err(_) => Err(PeerError::Timeout),
                };
                let _ = tx.send((client.name().to_string(), outcome)).await;
            });
        }
        drop(tx);

        let mut hits = Vec::new();
        let mut failed = 0usize;
        for _ in 0..self.peers.len() {
            let Some((peer, outcome)) = rx.recv().await else {
                break;
            };
            match outcome {
                Ok(peer_hits) => {
                    info!(
                        "event=peer_search module=federation status=ok peer={peer} hit_count={}",
                        peer_hits.len()
                    );
                    hits.extend(peer_hits);
                }
                Err(err) => {
                    failed += 1;
                    warn!("event=peer_search module=federation status=error peer={peer} error={err}");
                }
            }
        }

        info!(
            "event=federated_search module=federation status=ok duration_ms={} hit_count={} failed_peers={failed}",
            started_at.elapsed().as_millis(),
            hits.len()
        );
        hits
    }
}
