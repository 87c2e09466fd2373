//! Host to configuration registry
//!
//! Owned by whoever loads the server configuration and passed around
//! explicitly; there is no global lookup.

use std::collections::HashMap;

use tracing::debug;

use super::config::{assemble, Configuration, HostContext};
use super::directive::TlsDirective;
use super::Result;

/// Finished TLS configurations keyed by host
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    configs: HashMap<String, Configuration>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble `directive` for `host` and register the result
    ///
    /// On error nothing is registered and any earlier configuration for the
    /// host is left in place.
    pub fn configure(
        &mut self,
        host: &HostContext,
        directive: &TlsDirective,
    ) -> Result<&Configuration> {
        let config = assemble(host, directive)?;
        debug!(hostname = %host.hostname, "Registered TLS configuration");

        self.configs.insert(host.hostname.clone(), config);
        Ok(&self.configs[&host.hostname])
    }

    /// Configuration for a host, keyed by the hostname it was configured under
    pub fn get(&self, hostname: &str) -> Option<&Configuration> {
        self.configs.get(hostname)
    }

    /// Hosts that ended up with TLS enabled
    pub fn enabled_hosts(&self) -> impl Iterator<Item = (&str, &Configuration)> {
        self.configs
            .iter()
            .filter(|(_, config)| config.enabled())
            .map(|(host, config)| (host.as_str(), config))
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
