//! Configuration for the registry

use crate::types::{Principal, TokenId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Principal seeded with the ADMIN role at creation
    pub owner: Principal,

    /// Inclusive upper bound on issued token IDs
    pub max_token_id: TokenId,

    /// Collection identity
    pub collection: CollectionConfig,

    /// Operation limits
    pub limits: LimitsConfig,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Actor mailbox configuration
    pub mailbox: MailboxConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/registry"),
            service_name: "registry-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            owner: Principal::new("owner"),
            max_token_id: 10_000,
            collection: CollectionConfig::default(),
            limits: LimitsConfig::default(),
            rocksdb: RocksDBConfig::default(),
            mailbox: MailboxConfig::default(),
        }
    }
}

/// Collection identity, returned verbatim by the metadata accessors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Human-readable collection name
    pub name: String,

    /// Collection symbol
    pub symbol: String,

    /// Base URI prefix for token metadata
    pub base_uri: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: "Token Registry".to_string(),
            symbol: "REG".to_string(),
            base_uri: "http://localhost:3000/".to_string(),
        }
    }
}

/// Operation limits.
///
/// Both caps bound per-call iteration cost; they are configuration, not
/// hard-coded constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum tokens per mint batch
    pub max_mint_quantity: u32,

    /// Maximum page size for ownership enumeration
    pub max_page_limit: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_mint_quantity: 100,
            max_page_limit: 100,
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 2,
        }
    }
}

/// Actor mailbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Bounded mailbox depth (backpressure)
    pub capacity: usize,

    /// Broadcast buffer for event subscribers
    pub event_buffer: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            event_buffer: 1024,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults with environment variable overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("REGISTRY_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(owner) = std::env::var("REGISTRY_OWNER") {
            config.owner = Principal::new(owner);
        }

        if let Ok(max) = std::env::var("REGISTRY_MAX_TOKEN_ID") {
            config.max_token_id = max
                .parse()
                .map_err(|e| crate::Error::Config(format!("bad REGISTRY_MAX_TOKEN_ID: {}", e)))?;
        }

        if let Ok(base_uri) = std::env::var("REGISTRY_BASE_URI") {
            config.collection.base_uri = base_uri;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants
    pub fn validate(&self) -> crate::Result<()> {
        if self.owner.is_empty() {
            return Err(crate::Error::Config("owner must be non-empty".to_string()));
        }
        if self.limits.max_mint_quantity == 0 {
            return Err(crate::Error::Config(
                "max_mint_quantity must be at least 1".to_string(),
            ));
        }
        if self.limits.max_page_limit == 0 {
            return Err(crate::Error::Config(
                "max_page_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "registry-core");
        assert_eq!(config.limits.max_mint_quantity, 100);
        assert_eq!(config.limits.max_page_limit, 100);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_owner() {
        let mut config = Config::default();
        config.owner = Principal::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            data_dir = "/tmp/registry"
            service_name = "registry-core"
            service_version = "0.1.0"
            owner = "deployer"
            max_token_id = 42

            [collection]
            name = "Test Collection"
            symbol = "TST"
            base_uri = "http://localhost:3000/"

            [limits]
            max_mint_quantity = 50
            max_page_limit = 25

            [rocksdb]
            write_buffer_size_mb = 64
            max_write_buffer_number = 4
            target_file_size_mb = 64
            max_background_jobs = 2

            [mailbox]
            capacity = 16
            event_buffer = 16
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.owner.as_str(), "deployer");
        assert_eq!(config.max_token_id, 42);
        assert_eq!(config.limits.max_mint_quantity, 50);
        assert_eq!(config.collection.symbol, "TST");
    }
}
