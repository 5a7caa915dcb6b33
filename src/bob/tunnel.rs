//! BOB tunnel lifecycle.
//!
//! ```text
//! unconfigured --create/attach--> inactive --start--> active
//!                                  ^   |                 |
//!                                  |   +--clear--> removed
//!                                  +------stop-----------+
//! ```
//!
//! Every operation opens its own bridge connection, selects the tunnel by
//! nickname, issues its commands and quits. Nothing about the tunnel is cached
//! locally: the router is the only source of truth.

use std::time::{SystemTime, UNIX_EPOCH};

use super::BobClient;
use crate::{
    config::{BridgeConfig, TunnelConfig},
    data::{Destination, KeyPair},
    error::{Error, Result},
};

/// A named tunnel on the BOB bridge.
#[derive(Debug, Clone)]
pub struct Tunnel {
    nickname: String,
    bridge: BridgeConfig,
}

impl Tunnel {
    /// Selects or creates the tunnel, installs or generates keys, then
    /// applies every address setting present in `config`.
    pub fn create(config: TunnelConfig, bridge: BridgeConfig) -> Result<Self> {
        let nickname = config.nickname.clone().unwrap_or_else(default_nickname);
        let tunnel = Self { nickname, bridge };

        tunnel.session(Selection::SelectOrCreate, |client| {
            match &config.keys {
                Some(keys) => {
                    client.setkeys(keys)?;
                }
                None => match client.getkeys() {
                    Ok(_) => {}
                    Err(Error::Protocol(_)) => {
                        client.newkeys()?;
                    }
                    Err(e) => return Err(e),
                },
            }

            if let Some(quiet) = config.quiet {
                client.quiet(quiet)?;
            }
            if let Some(host) = &config.inhost {
                client.inhost(host)?;
            }
            if let Some(port) = config.inport {
                client.inport(port)?;
            }
            if let Some(host) = &config.outhost {
                client.outhost(host)?;
            }
            if let Some(port) = config.outport {
                client.outport(port)?;
            }
            Ok(())
        })?;

        tracing::debug!(nickname = %tunnel.nickname, "tunnel configured");
        Ok(tunnel)
    }

    /// Attaches to an existing tunnel without changing it. Fails if the
    /// bridge doesn't know `nickname`.
    pub fn attach(nickname: impl Into<String>, bridge: BridgeConfig) -> Result<Self> {
        let tunnel = Self {
            nickname: nickname.into(),
            bridge,
        };
        tunnel.with_client(|_| Ok(()))?;
        Ok(tunnel)
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn bridge(&self) -> &BridgeConfig {
        &self.bridge
    }

    /// Fetches the tunnel's destination from the bridge.
    pub fn destination(&self) -> Result<Destination> {
        self.with_client(|client| client.getdest())
    }

    /// Fetches the tunnel's key pair from the bridge.
    pub fn keys(&self) -> Result<KeyPair> {
        self.with_client(|client| client.getkeys())
    }

    /// Sets an I2CP option on the tunnel.
    pub fn option(&self, key: &str, value: &str) -> Result<&Self> {
        self.with_client(|client| client.option(key, value).map(|_| ()))?;
        Ok(self)
    }

    pub fn start(&self) -> Result<&Self> {
        self.with_client(|client| client.start().map(|_| ()))?;
        tracing::info!(nickname = %self.nickname, "tunnel started");
        Ok(self)
    }

    pub fn stop(&self) -> Result<&Self> {
        self.with_client(|client| client.stop().map(|_| ()))?;
        tracing::info!(nickname = %self.nickname, "tunnel stopped");
        Ok(self)
    }

    /// Removes the tunnel from the bridge. Fails while it is active.
    pub fn clear(&self) -> Result<()> {
        self.with_client(|client| client.clear().map(|_| ()))?;
        tracing::info!(nickname = %self.nickname, "tunnel cleared");
        Ok(())
    }

    /// Stops the tunnel if it is running, then removes it.
    pub fn remove(&self) -> Result<()> {
        self.with_client(|client| {
            if let Err(e) = client.stop() {
                tracing::debug!(error = %e, "stop before clear refused");
            }
            client.clear().map(|_| ())
        })?;
        tracing::info!(nickname = %self.nickname, "tunnel removed");
        Ok(())
    }

    /// Starts the tunnel and returns a guard that stops it when dropped.
    pub fn activate(&self) -> Result<ActiveTunnel<'_>> {
        self.start()?;
        Ok(ActiveTunnel {
            tunnel: self,
            stopped: false,
        })
    }

    /// Starts the tunnel, runs `f`, and stops the tunnel on every way out of
    /// `f`, including a panic.
    pub fn run<T>(&self, f: impl FnOnce(&Tunnel) -> T) -> Result<T> {
        let active = self.activate()?;
        let value = f(self);
        active.stop()?;
        Ok(value)
    }

    /// Opens a client, selects this existing tunnel, runs `f` and quits.
    fn with_client<T>(&self, f: impl FnOnce(&mut BobClient) -> Result<T>) -> Result<T> {
        self.session(Selection::Existing, f)
    }

    fn session<T>(
        &self,
        selection: Selection,
        f: impl FnOnce(&mut BobClient) -> Result<T>,
    ) -> Result<T> {
        let mut client = BobClient::open(self.bridge.clone())?;
        match selection {
            Selection::Existing => client.getnick(&self.nickname)?,
            Selection::SelectOrCreate => client.select_or_create(&self.nickname)?,
        };
        let value = f(&mut client)?;
        if let Err(e) = client.quit() {
            tracing::debug!(error = %e, "quit after {} failed", self.nickname);
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Selection {
    Existing,
    SelectOrCreate,
}

/// A started tunnel. Dropping the guard stops the tunnel.
#[derive(Debug)]
pub struct ActiveTunnel<'a> {
    tunnel: &'a Tunnel,
    stopped: bool,
}

impl ActiveTunnel<'_> {
    pub fn tunnel(&self) -> &Tunnel {
        self.tunnel
    }

    /// Stops the tunnel now and reports the outcome.
    pub fn stop(mut self) -> Result<()> {
        self.stopped = true;
        self.tunnel.stop().map(|_| ())
    }
}

impl Drop for ActiveTunnel<'_> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        if let Err(e) = self.tunnel.stop() {
            tracing::warn!(nickname = %self.tunnel.nickname, error = %e, "failed to stop tunnel");
        }
    }
}

fn default_nickname() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}
