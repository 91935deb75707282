//! Client and server configuration.
//!
//! Both halves live in one JSON file, by default
//! `<config dir>/vmtp/config.json`. Missing fields take their defaults, so a
//! file only needs the settings it changes:
//!
//! ```json
//! { "client": { "host": "mx.example.com" }, "server": { "port": 2525 } }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vmtp_smtp::DispatcherConfig;
use vmtp_smtp::server::DEFAULT_MAX_MESSAGE_SIZE;

/// Default SMTP port used by the client.
pub const DEFAULT_CLIENT_PORT: u16 = 25;

/// Default port the server listens on.
pub const DEFAULT_SERVER_PORT: u16 = 8025;

/// Default envelope sender.
pub const DEFAULT_SENDER: &str = "noreply@example.com";

/// Settings for sending messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Envelope sender and `From` address.
    pub sender: String,
    /// Name sent with `EHLO`.
    pub client_hostname: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_CLIENT_PORT,
            sender: DEFAULT_SENDER.to_string(),
            client_hostname: "localhost".to_string(),
        }
    }
}

/// Settings for receiving messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Name announced in the greeting and EHLO reply.
    pub hostname: String,
    /// Whether VMTP is advertised and accepted.
    pub enable_vmtp: bool,
    /// Maximum accepted message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_SERVER_PORT,
            hostname: "localhost".to_string(),
            enable_vmtp: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` pair to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the protocol-level dispatcher configuration.
    #[must_use]
    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig::builder(self.hostname.clone())
            .enable_vmtp(self.enable_vmtp)
            .max_message_size(self.max_message_size)
            .build()
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Client settings.
    pub client: ClientConfig,
    /// Server settings.
    pub server: ServerConfig,
}

impl Config {
    /// Returns the default configuration file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vmtp")
            .join("config.json")
    }

    /// Loads configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    /// Loads configuration from a file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    /// Parses configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or a value is out of
    /// range.
    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.client.host.is_empty() {
            return Err(Error::Config("client host must not be empty".into()));
        }
        if self.server.hostname.is_empty() {
            return Err(Error::Config("server hostname must not be empty".into()));
        }
        if self.server.max_message_size == 0 {
            return Err(Error::Config("max_message_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let config = Config::default();
        assert_eq!(config.client.host, "localhost");
        assert_eq!(config.client.port, 25);
        assert_eq!(config.client.sender, "noreply@example.com");
        assert_eq!(config.server.port, 8025);
        assert!(config.server.enable_vmtp);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config =
            Config::from_json(r#"{ "client": { "host": "mx.example.com" }, "server": { "port": 2525 } }"#)
                .unwrap();
        assert_eq!(config.client.host, "mx.example.com");
        assert_eq!(config.client.port, 25);
        assert_eq!(config.server.port, 2525);
        assert_eq!(config.server.hostname, "localhost");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Config::from_json(r#"{ "server": { "max_message_size": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Serde(_)));
    }

    #[test]
    fn server_config_builds_dispatcher() {
        let server = ServerConfig {
            hostname: "mx.test".into(),
            enable_vmtp: false,
            max_message_size: 1024,
            ..ServerConfig::default()
        };
        let dispatcher = server.dispatcher();
        assert_eq!(dispatcher.hostname, "mx.test");
        assert!(!dispatcher.enable_vmtp);
        assert_eq!(dispatcher.max_message_size, 1024);
        assert_eq!(server.bind_address(), "localhost:8025");
    }

    #[test]
    fn default_path_ends_with_vmtp_config() {
        assert!(Config::default_path().ends_with("vmtp/config.json"));
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("vmtp-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.json");

        let mut config = Config::default();
        config.client.sender = "ops@example.com".into();
        config.save(&path).await.unwrap();

        assert_eq!(Config::load(&path).await.unwrap(), config);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("vmtp-config-does-not-exist.json");
        assert_eq!(
            Config::load_or_default(&path).await.unwrap(),
            Config::default()
        );
    }
}
