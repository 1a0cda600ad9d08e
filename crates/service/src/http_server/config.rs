use std::net::{Ipv4Addr, SocketAddr};

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,

    // level request traces are recorded at
    pub trace_level: tracing::Level,
}

impl Config {
    /// Listen on every interface at `port`.
    pub fn new(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000)),
            trace_level: tracing::Level::DEBUG,
        }
    }
}
