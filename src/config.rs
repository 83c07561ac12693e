//! Configuration manager for userbase.

use std::fs::File;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TABLE: &str = "users";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Listening address.
    pub address: IpAddr,
    /// Listening port, `PORT` environment variable takes precedence.
    pub port: u16,
    /// Related to record store configuration.
    pub store: StoreConfig,
    #[serde(skip_deserializing)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            store: StoreConfig::default(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
        }
    }
}

/// Kind of record store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process memory, lost on shutdown.
    #[default]
    Memory,
    /// Amazon DynamoDB table.
    #[serde(rename = "dynamodb")]
    DynamoDb,
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Table name.
    pub table: String,
    /// AWS region, default provider chain otherwise.
    pub region: Option<String>,
    /// Custom endpoint, such as DynamoDB Local.
    pub endpoint: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            table: DEFAULT_TABLE.to_owned(),
            region: None,
            endpoint: None,
        }
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Version of the running binary.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Normalizes a URL string by ensuring it starts with a scheme, `http` by
    /// default.
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("http://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config = match File::open(file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file) {
                Ok(config) => config,
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        // set app version.
        config.version = VERSION.to_owned();

        config.store.endpoint = config
            .store
            .endpoint
            .map(|endpoint| self.normalize_url(&endpoint))
            .transpose()?;

        if let Some(port) = std::env::var("PORT").ok().and_then(|port| port.parse().ok()) {
            config.port = port;
        }

        Ok(Arc::new(config))
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` cannot be read, using defaults");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dynamodb_config() {
        let config: Configuration = serde_yaml::from_str(
            r#"
name: users-eu
port: 3000
store:
  backend: dynamodb
  table: people
  region: eu-west-3
"#,
        )
        .unwrap();

        assert_eq!(config.name, "users-eu");
        assert_eq!(config.port, 3000);
        assert_eq!(config.address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.store.backend, Backend::DynamoDb);
        assert_eq!(config.store.table, "people");
        assert_eq!(config.store.region.as_deref(), Some("eu-west-3"));
        assert_eq!(config.store.endpoint, None);
    }

    #[test]
    fn test_empty_config_uses_memory_store() {
        let config: Configuration = serde_yaml::from_str("name: users").unwrap();

        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.table, DEFAULT_TABLE);
    }

    #[test]
    fn test_normalize_endpoint() {
        let config = Configuration::default();

        assert_eq!(
            config.normalize_url("localhost:8000").unwrap(),
            "http://localhost:8000/"
        );
        assert_eq!(
            config.normalize_url("https://dynamodb.eu-west-3.amazonaws.com").unwrap(),
            "https://dynamodb.eu-west-3.amazonaws.com/"
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Configuration::default()
            .path(PathBuf::from("does/not/exist.yaml"))
            .read()
            .unwrap();

        assert_eq!(config.version(), VERSION);
        assert_eq!(config.store, StoreConfig::default());
    }
}
