//! Peer search clients.

use crate::model::peer::Peer;
use crate::search::{PartHit, PartQuery};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Path of the read-only federated search endpoint on every peer.
pub const FEDERATED_SEARCH_PATH: &str = "/api/federated/search";

/// Failure of one peer query. Never escapes the fan-out.
#[derive(Debug)]
pub enum PeerError {
    /// Connection, TLS or body transfer failure.
    Transport(String),
    /// Peer answered with a status other than 200.
    Status(u16),
    /// Body is not a JSON array of hits.
    Decode(String),
    /// Per-peer deadline elapsed.
    Timeout,
}

impl Display for PeerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "peer transport failure: {message}"),
            Self::Status(status) => write!(f, "peer answered status {status}"),
            Self::Decode(message) => write!(f, "malformed peer payload: {message}"),
            Self::Timeout => write!(f, "peer timed out"),
        }
    }
}

impl Error for PeerError {}

/// One queryable remote catalog.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Peer name used to label its hits.
    fn name(&self) -> &str;

    /// Runs one compatibility query on the peer.
    async fn search(&self, query: &PartQuery) -> Result<Vec<PartHit>, PeerError>;
}

/// HTTP client for the federated search endpoint.
pub struct HttpPeerClient {
    peer: Peer,
    client: Client,
}

impl HttpPeerClient {
    /// Builds a client whose transport timeout matches the fan-out deadline.
    pub fn new(peer: Peer, timeout: Duration) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PeerError::Transport(err.to_string()))?;
        Ok(Self { peer, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{FEDERATED_SEARCH_PATH}",
            self.peer.url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    fn name(&self) -> &str {
        &self.peer.name
    }

    async fn search(&self, query: &PartQuery) -> Result<Vec<PartHit>, PeerError> {
        let prop = query.prop_expression();
        let response = self
            .client
            .get(self.endpoint())
            .bearer_auth(&self.peer.api_key)
            .query(&[
                ("type", query.type_name.as_str()),
                ("name", query.name.as_str()),
                ("prop", prop.as_str()),
            ])
            .send()
            .await
            .map_err(|err| PeerError::Transport(err.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(PeerError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| PeerError::Transport(err.to_string()))?;
        let mut hits: Vec<PartHit> =
            serde_json::from_str(&body).map_err(|err| PeerError::Decode(err.to_string()))?;
        for hit in &mut hits {
            hit.source = self.peer.name.clone();
        }
        Ok(hits)
    }
}
