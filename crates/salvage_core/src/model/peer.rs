//! Federation peer model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remote catalog instance queried during federated search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Store id; `0` for peers declared only in configuration.
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// Base URL, e.g. `https://stock.example.org`.
    pub url: String,
    /// Read-only token sent as `Authorization: Bearer <api_key>`.
    #[serde(alias = "token")]
    pub api_key: String,
}

/// Generates a fresh read-only access token to hand out to a peer.
pub fn generate_peer_token() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::generate_peer_token;

    #[test]
    fn generated_tokens_are_unique_uuids() {
        let first = generate_peer_token();
        let second = generate_peer_token();
        assert_ne!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }
}
