//! Registry configuration

/// Default name the local driver registers under
pub const DEFAULT_PROVIDER_NAME: &str = "loc";

/// Peer registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of live peers (0 = unlimited)
    pub max_peers: usize,

    /// Short name the local driver registers with the span host
    pub provider_name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_peers: 0, // Unlimited
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Set maximum number of live peers
    pub fn max_peers(mut self, max: usize) -> Self {
        self.max_peers = max;
        self
    }

    /// Set the provider name
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Whether `count` live peers leaves room for another
    pub(crate) fn has_capacity(&self, count: usize) -> bool {
        self.max_peers == 0 || count < self.max_peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.max_peers, 0);
        assert_eq!(config.provider_name, "loc");
        assert!(config.has_capacity(usize::MAX - 1));
    }

    #[test]
    fn test_builder_max_peers() {
        let config = RegistryConfig::default().max_peers(2);

        assert!(config.has_capacity(1));
        assert!(!config.has_capacity(2));
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .provider_name("loopback")
            .max_peers(16);

        assert_eq!(config.provider_name, "loopback");
        assert_eq!(config.max_peers, 16);
    }
}
