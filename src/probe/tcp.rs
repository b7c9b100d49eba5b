//! TCP connect round-trip prober
//!
//! Raw ICMP needs elevated privileges, so reachability is measured as the
//! time to complete (or be refused) a TCP handshake on a fixed port.

use super::{ProbeError, Prober, RawProbe};
use crate::dns::HostResolver;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::RwLock;

/// Default port probed on VPN endpoints
pub const DEFAULT_PROBE_PORT: u16 = crate::defaults::DEFAULT_PROBE_PORT;

/// Prober that times TCP handshakes against resolved endpoint addresses.
///
/// Addresses found by [`Prober::resolve`] are kept for the later attempts,
/// so a host run costs one lookup.
#[derive(Clone)]
pub struct TcpProber {
    resolver: HostResolver,
    port: u16,
    addresses: Arc<RwLock<HashMap<String, SocketAddr>>>,
}

impl TcpProber {
    pub fn new(resolver: HostResolver, port: u16) -> Self {
        Self { resolver, port, addresses: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address kept from an earlier successful resolution
    pub async fn cached_address(&self, hostname: &str) -> Option<SocketAddr> {
        self.addresses.read().await.get(hostname.trim()).copied()
    }

    async fn first_address(&self, hostname: &str) -> std::result::Result<SocketAddr, ProbeError> {
        let ips = self
            .resolver
            .resolve(hostname)
            .await
            .map_err(|e| ProbeError::host_unknown(e.to_string()))?;

        let address = ips
            .first()
            .map(|ip| SocketAddr::new(*ip, self.port))
            .ok_or_else(|| ProbeError::host_unknown(format!("Cannot resolve {}", hostname)))?;

        self.addresses.write().await.insert(hostname.trim().to_string(), address);
        Ok(address)
    }

    async fn address_for(&self, hostname: &str) -> std::result::Result<SocketAddr, ProbeError> {
        match self.cached_address(hostname).await {
            Some(address) => Ok(address),
            None => self.first_address(hostname).await,
        }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn resolve(&self, hostname: &str) -> std::result::Result<(), ProbeError> {
        self.first_address(hostname).await.map(|_| ())
    }

    /// One attempt, lookup included, bounded by `timeout`. Only the
    /// handshake itself is timed.
    async fn probe(&self, hostname: &str, timeout: Duration) -> RawProbe {
        let attempt = async {
            let address = self.address_for(hostname).await?;
            let started = Instant::now();
            let connected = TcpStream::connect(address).await;
            Ok::<_, ProbeError>((address, started, connected))
        };

        match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok((_, started, Ok(_stream)))) => RawProbe::Measured(elapsed_ms(started)),
            // A refusal is still a full round trip to the endpoint
            Ok(Ok((_, started, Err(error)))) if error.kind() == ErrorKind::ConnectionRefused => {
                RawProbe::Measured(elapsed_ms(started))
            }
            Ok(Ok((address, _, Err(error)))) if error.kind() == ErrorKind::TimedOut => {
                RawProbe::Failed(ProbeError::timeout(format!("Connection to {} timed out", address)))
            }
            Ok(Ok((address, _, Err(error)))) => RawProbe::Failed(ProbeError::other(format!(
                "Connection to {} failed: {}",
                address, error
            ))),
            Ok(Err(error)) => RawProbe::Failed(error),
            Err(_) => RawProbe::Failed(ProbeError::timeout(format!(
                "Request timed out after {:.1}s",
                timeout.as_secs_f64()
            ))),
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
