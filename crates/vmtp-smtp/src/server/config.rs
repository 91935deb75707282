//! Server configuration types.

/// Default maximum message size (32 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 33_554_432;

/// Per-server dispatcher configuration, shared read-only by all sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Hostname announced in the greeting and EHLO reply.
    pub hostname: String,
    /// Whether VMTP is advertised and its commands accepted.
    pub enable_vmtp: bool,
    /// Maximum accepted message size in bytes.
    pub max_message_size: usize,
}

impl DispatcherConfig {
    /// Creates a configuration with VMTP enabled.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            enable_vmtp: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(hostname: impl Into<String>) -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::new(hostname)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

/// Builder for dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfigBuilder {
    config: DispatcherConfig,
}

impl DispatcherConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            config: DispatcherConfig::new(hostname),
        }
    }

    /// Enables or disables VMTP.
    #[must_use]
    pub const fn enable_vmtp(mut self, enable: bool) -> Self {
        self.config.enable_vmtp = enable;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> DispatcherConfig {
        self.config
    }
}
