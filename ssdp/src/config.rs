//! The engine's configuration surface: everything that is fixed for
//! the lifetime of one peer identity.

/// The advertised `LOCATION` header's components.
///
/// When `host` is empty, the engine substitutes the sending
/// interface's own IP at build time, which is how one peer produces a
/// distinct `LOCATION` per interface.
#[derive(Debug, Clone, Default)]
pub struct LocationConfig {
    pub host: String,
    pub port: u16,
    pub uri: String,
}

/// The header fields every outgoing packet carries, and the single
/// `ST` an incoming packet is filtered against.
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    pub st: String,
    pub usn: String,
    pub sm_id: String,
    pub device_type: String,
    pub location: LocationConfig,
}

/// Immutable-after-construction configuration for one [`crate::engine::Engine`].
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub neighbor_timeout_ms: u64,
    pub header: HeaderConfig,
}

impl Config {
    /// The reference implementation's default SSDP port and neighbor
    /// timeout (15s).
    pub fn new(st: impl Into<String>, usn: impl Into<String>) -> Self {
        Config {
            port: 1900,
            neighbor_timeout_ms: 15_000,
            header: HeaderConfig {
                st: st.into(),
                usn: usn.into(),
                sm_id: String::new(),
                device_type: String::new(),
                location: LocationConfig::default(),
            },
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_neighbor_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.neighbor_timeout_ms = timeout_ms;
        self
    }

    pub fn with_sm_id(mut self, sm_id: impl Into<String>) -> Self {
        self.header.sm_id = sm_id.into();
        self
    }

    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.header.device_type = device_type.into();
        self
    }

    pub fn with_location(mut self, host: impl Into<String>, port: u16, uri: impl Into<String>) -> Self {
        self.header.location = LocationConfig {
            host: host.into(),
            port,
            uri: uri.into(),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_carries_the_reference_defaults() {
        let c = Config::new("ST_P2P", "nodeX");
        assert_eq!(c.port, 1900);
        assert_eq!(c.neighbor_timeout_ms, 15_000);
        assert_eq!(c.header.st, "ST_P2P");
        assert_eq!(c.header.usn, "nodeX");
    }

    #[test]
    fn builder_methods_compose() {
        let c = Config::new("ST_P2P", "nodeX")
            .with_port(19100)
            .with_sm_id("1")
            .with_device_type("node")
            .with_location("", 5678, "");
        assert_eq!(c.port, 19100);
        assert_eq!(c.header.sm_id, "1");
        assert_eq!(c.header.location.port, 5678);
    }
}
