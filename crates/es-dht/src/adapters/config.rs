use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{DhtConfig, DhtError, NodeId};
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Static configuration provider with hardcoded values.
///
/// Useful for testing and development. For deployments, use `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    bootstrap_nodes: Vec<NodeId>,
    config: DhtConfig,
}

impl StaticConfigProvider {
    /// Create with default config and no bootstrap nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with specified bootstrap nodes.
    #[must_use]
    pub fn with_bootstrap_nodes(mut self, nodes: Vec<NodeId>) -> Self {
        self.bootstrap_nodes = nodes;
        self
    }

    /// Create with specified DHT config.
    #[must_use]
    pub fn with_config(mut self, config: DhtConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn dht_config(&self) -> DhtConfig {
        self.config.clone()
    }

    fn bootstrap_nodes(&self) -> Vec<NodeId> {
        self.bootstrap_nodes.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Config loading from file
// ============================================================================

/// Configuration file structure.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    bootstrap: BootstrapSection,
    #[serde(default)]
    dht: DhtConfig,
}

#[derive(Debug, Deserialize, Default)]
struct BootstrapSection {
    /// Hex-encoded node identifiers.
    #[serde(default)]
    nodes: Vec<String>,
}

/// TOML-based configuration provider.
///
/// # Config File Format
///
/// ```toml
/// [bootstrap]
/// nodes = [
///     "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4",
/// ]
///
/// [dht]
/// bucket_size = 20
/// state_history_size = 1000
/// fraction_of_nodes_from_same_peer = 0.2
/// ```
///
/// Missing keys take their defaults; the resulting config is validated.
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    bootstrap_nodes: Vec<NodeId>,
    config: DhtConfig,
}

impl TomlConfigProvider {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DhtError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            DhtError::ConfigFile(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, DhtError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| DhtError::ConfigFile(e.to_string()))?;
        file.dht.validate()?;

        let bootstrap_nodes = file
            .bootstrap
            .nodes
            .iter()
            .map(|node| {
                hex::decode(node)
                    .map(NodeId::new)
                    .map_err(|e| DhtError::ConfigFile(format!("bootstrap node {node}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bootstrap_nodes,
            config: file.dht,
        })
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn dht_config(&self) -> DhtConfig {
        self.config.clone()
    }

    fn bootstrap_nodes(&self) -> Vec<NodeId> {
        self.bootstrap_nodes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_provider() {
        let seed = NodeId::new(vec![1u8; 32]);
        let provider = StaticConfigProvider::new()
            .with_bootstrap_nodes(vec![seed.clone()])
            .with_config(DhtConfig::for_testing());

        assert_eq!(provider.bootstrap_nodes(), vec![seed]);
        assert_eq!(provider.dht_config(), DhtConfig::for_testing());
    }

    #[test]
    fn test_toml_full() {
        let provider = TomlConfigProvider::parse(
            r#"
            [bootstrap]
            nodes = ["0102", "ff00"]

            [dht]
            bucket_size = 8
            state_history_size = 50
            fraction_of_nodes_from_same_peer = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(
            provider.bootstrap_nodes(),
            vec![NodeId::new(vec![1, 2]), NodeId::new(vec![0xff, 0])]
        );
        let config = provider.dht_config();
        assert_eq!(config.bucket_size, 8);
        assert_eq!(config.state_history_size, 50);
        assert!((config.fraction_of_nodes_from_same_peer - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_toml_defaults() {
        let provider = TomlConfigProvider::parse("[dht]\nbucket_size = 16\n").unwrap();
        let config = provider.dht_config();
        assert_eq!(config.bucket_size, 16);
        assert_eq!(config.state_history_size, 1000);
        assert!(provider.bootstrap_nodes().is_empty());

        let empty = TomlConfigProvider::parse("").unwrap();
        assert_eq!(empty.dht_config(), DhtConfig::default());
    }

    #[test]
    fn test_toml_rejects_invalid() {
        assert!(matches!(
            TomlConfigProvider::parse("[dht]\nbucket_size = 0\n"),
            Err(DhtError::InvalidConfig(_))
        ));
        assert!(matches!(
            TomlConfigProvider::parse("[bootstrap]\nnodes = [\"zz\"]\n"),
            Err(DhtError::ConfigFile(_))
        ));
        assert!(matches!(
            TomlConfigProvider::parse("not toml at all ="),
            Err(DhtError::ConfigFile(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            TomlConfigProvider::load("/nonexistent/es-dht.toml"),
            Err(DhtError::ConfigFile(_))
        ));
    }
}
