//! Local network connectivity probe

use std::time::Duration;

use async_trait::async_trait;
use lubesync_core::ConnectivityProbe;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use crate::http::TransportError;

/// Reports connectivity by opening a TCP connection to the service host.
#[derive(Debug, Clone)]
pub struct HostConnectivityProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl HostConnectivityProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self { host: host.into(), port, timeout }
    }

    /// Probe the host and port (explicit or scheme default) of `base_url`.
    pub fn from_base_url(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let url = Url::parse(base_url)
            .map_err(|e| TransportError::Config(format!("invalid base URL {base_url}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| TransportError::Config(format!("base URL {base_url} has no host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| TransportError::Config(format!("base URL {base_url} has no port")))?;
        Ok(Self::new(host, port, timeout))
    }

    pub fn target(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

#[async_trait]
impl ConnectivityProbe for HostConnectivityProbe {
    async fn is_connected(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                debug!(host = %self.host, port = self.port, error = %err, "Connectivity probe failed");
                false
            }
            Err(_) => {
                debug!(host = %self.host, port = self.port, "Connectivity probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn default_ports_follow_scheme() {
        let probe = HostConnectivityProbe::from_base_url("https://lube.example", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.target(), ("lube.example", 443));

        let probe =
            HostConnectivityProbe::from_base_url("http://10.0.0.5:5000/app", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.target(), ("10.0.0.5", 5000));

        assert!(HostConnectivityProbe::from_base_url("nonsense", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn listening_host_is_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = HostConnectivityProbe::new("127.0.0.1", port, Duration::from_secs(1));
        assert!(probe.is_connected().await);

        drop(listener);
        assert!(!probe.is_connected().await);
    }
}
