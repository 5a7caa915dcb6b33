//! Bridge connection settings.
//!
//! Default host and port for each bridge come from the environment once per
//! process:
//!
//! | bridge | host variable  | port variable  | default          |
//! |--------|----------------|----------------|------------------|
//! | BOB    | `I2P_BOB_HOST` | `I2P_BOB_PORT` | `127.0.0.1:2827` |
//! | SAM    | `I2P_SAM_HOST` | `I2P_SAM_PORT` | `127.0.0.1:7656` |

use std::{sync::OnceLock, time::Duration};

use crate::data::KeyPair;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const BOB_DEFAULT_PORT: u16 = 2827;
pub const SAM_DEFAULT_PORT: u16 = 7656;

/// Bound on every connect, read and write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    host: String,
    port: u16,
}

fn endpoint_from_env(host_var: &str, port_var: &str, default_port: u16) -> Endpoint {
    let host = std::env::var(host_var)
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match std::env::var(port_var) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(
                variable = port_var,
                value = %value,
                "ignoring invalid port, using {}",
                default_port
            );
            default_port
        }),
        Err(_) => default_port,
    };
    Endpoint { host, port }
}

fn bob_endpoint() -> &'static Endpoint {
    static ENDPOINT: OnceLock<Endpoint> = OnceLock::new();
    ENDPOINT.get_or_init(|| endpoint_from_env("I2P_BOB_HOST", "I2P_BOB_PORT", BOB_DEFAULT_PORT))
}

fn sam_endpoint() -> &'static Endpoint {
    static ENDPOINT: OnceLock<Endpoint> = OnceLock::new();
    ENDPOINT.get_or_init(|| endpoint_from_env("I2P_SAM_HOST", "I2P_SAM_PORT", SAM_DEFAULT_PORT))
}

/// Where a bridge listens and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    /// Log every raw protocol line at `debug` instead of `trace`.
    pub debug: bool,
}

impl BridgeConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Some(DEFAULT_TIMEOUT),
            debug: false,
        }
    }

    /// Process defaults for the BOB bridge.
    pub fn bob() -> Self {
        let endpoint = bob_endpoint();
        Self::new(endpoint.host.clone(), endpoint.port)
    }

    /// Process defaults for the SAM bridge.
    pub fn sam() -> Self {
        let endpoint = sam_endpoint();
        Self::new(endpoint.host.clone(), endpoint.port)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings applied when creating a BOB tunnel. `None` leaves the router's
/// value alone.
#[derive(Debug, Clone, Default)]
pub struct TunnelConfig {
    /// Defaults to the current Unix time in seconds.
    pub nickname: Option<String>,
    /// Existing key material; fresh keys are generated when absent.
    pub keys: Option<KeyPair>,
    pub quiet: Option<bool>,
    pub inhost: Option<String>,
    pub inport: Option<u16>,
    pub outhost: Option<String>,
    pub outport: Option<u16>,
}

impl TunnelConfig {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: Some(nickname.into()),
            ..Default::default()
        }
    }

    /// An inbound tunnel listening on `host:port`.
    pub fn inbound(nickname: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            inhost: Some(host.into()),
            inport: Some(port),
            ..Self::new(nickname)
        }
    }

    /// An outbound tunnel forwarding to `host:port`.
    pub fn outbound(nickname: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            outhost: Some(host.into()),
            outport: Some(port),
            ..Self::new(nickname)
        }
    }

    pub fn with_keys(mut self, keys: KeyPair) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }
}
