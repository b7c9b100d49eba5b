//! Hostname resolution for probe targets

use crate::defaults::DEFAULT_TIMEOUT;
use crate::error::{AppError, Result};
use std::net::IpAddr;
use std::time::Duration;
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf,
    TokioAsyncResolver,
};

/// Which resolver configuration a [`HostResolver`] was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverSource {
    /// The operating system's resolver configuration
    System,
    /// Built-in public defaults, used when the system configuration is unreadable
    Fallback,
}

/// Async DNS resolver shared by every probe task.
///
/// Cloning is cheap; clones share the underlying resolver and its cache.
/// Every lookup is bounded by `lookup_timeout`, whatever the upstream
/// servers do.
#[derive(Clone)]
pub struct HostResolver {
    resolver: TokioAsyncResolver,
    source: ResolverSource,
    lookup_timeout: Duration,
}

impl HostResolver {
    /// Build a resolver from the system configuration.
    ///
    /// Falls back to the library defaults when the system configuration
    /// cannot be read, so probing still works in minimal containers.
    pub fn system() -> Self {
        Self::system_with_timeout(DEFAULT_TIMEOUT)
    }

    /// Like [`HostResolver::system`], with lookups bounded by `lookup_timeout`
    pub fn system_with_timeout(lookup_timeout: Duration) -> Self {
        match system_conf::read_system_conf() {
            Ok((config, opts)) => Self::build(config, opts, lookup_timeout, ResolverSource::System),
            Err(_) => Self::fallback_with_timeout(lookup_timeout),
        }
    }

    /// Build a resolver from the library's default upstream servers
    pub fn fallback() -> Self {
        Self::fallback_with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn fallback_with_timeout(lookup_timeout: Duration) -> Self {
        Self::build(
            ResolverConfig::default(),
            ResolverOpts::default(),
            lookup_timeout,
            ResolverSource::Fallback,
        )
    }

    /// Build a resolver against explicit upstream servers
    pub fn with_config(config: ResolverConfig, lookup_timeout: Duration) -> Self {
        Self::build(config, ResolverOpts::default(), lookup_timeout, ResolverSource::Fallback)
    }

    fn build(
        config: ResolverConfig,
        mut opts: ResolverOpts,
        lookup_timeout: Duration,
        source: ResolverSource,
    ) -> Self {
        // One query per server, each within the lookup budget
        opts.timeout = lookup_timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            source,
            lookup_timeout,
        }
    }

    pub fn source(&self) -> ResolverSource {
        self.source
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Resolve a hostname to its addresses.
    ///
    /// IP literals are returned as-is without a lookup. An empty answer is an
    /// error, with a message that reads as a name-resolution failure.
    pub async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>> {
        let hostname = hostname.trim();

        if hostname.is_empty() {
            return Err(AppError::dns("Cannot resolve an empty hostname"));
        }

        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let response = tokio::time::timeout(self.lookup_timeout, self.resolver.lookup_ip(hostname))
            .await
            .map_err(|_| {
                AppError::dns(format!(
                    "Cannot resolve {}: lookup timed out after {:.1}s",
                    hostname,
                    self.lookup_timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| AppError::dns(format!("Cannot resolve {}: {}", hostname, e)))?;

        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(AppError::dns(format!("Cannot resolve {}: unknown host", hostname)));
        }

        Ok(ips)
    }
}
