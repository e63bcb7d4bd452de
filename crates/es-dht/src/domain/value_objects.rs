//! Configuration value objects.

use serde::{Deserialize, Serialize};

use super::errors::DhtError;

/// Tunables of a DHT instance.
///
/// Every field has a default, so a partial `[dht]` TOML table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DhtConfig {
    /// Leaf capacity `k` of the peer trie, and default lookup width.
    pub bucket_size: usize,
    /// How many committed state versions stay answerable.
    pub state_history_size: usize,
    /// Largest share of lookup candidates one relaying peer may contribute.
    pub fraction_of_nodes_from_same_peer: f64,
}

impl Default for DhtConfig {
    fn default() -> Self {
        Self {
            bucket_size: 20,
            state_history_size: 1000,
            fraction_of_nodes_from_same_peer: 0.2,
        }
    }
}

impl DhtConfig {
    /// Create a configuration for testing with small limits.
    pub fn for_testing() -> Self {
        Self {
            bucket_size: 4,
            state_history_size: 8,
            fraction_of_nodes_from_same_peer: 0.5,
        }
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> Result<(), DhtError> {
        if self.bucket_size == 0 {
            return Err(DhtError::InvalidConfig(
                "bucket_size cannot be 0".to_string(),
            ));
        }
        if self.state_history_size == 0 {
            return Err(DhtError::InvalidConfig(
                "state_history_size cannot be 0".to_string(),
            ));
        }
        let fraction = self.fraction_of_nodes_from_same_peer;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(DhtError::InvalidConfig(format!(
                "fraction_of_nodes_from_same_peer must be in (0, 1], got {fraction}"
            )));
        }
        Ok(())
    }

    /// Builder-style method to set the bucket size
    pub fn with_bucket_size(mut self, k: usize) -> Self {
        self.bucket_size = k;
        self
    }

    /// Builder-style method to set the history size
    pub fn with_state_history_size(mut self, size: usize) -> Self {
        self.state_history_size = size;
        self
    }

    /// Builder-style method to set the anti-Sybil fraction
    pub fn with_fraction_of_nodes_from_same_peer(mut self, fraction: f64) -> Self {
        self.fraction_of_nodes_from_same_peer = fraction;
        self
    }
}
