use std::fmt::Display;

use super::Reply;
use crate::{
    config::BridgeConfig,
    data::{Destination, KeyPair, Structure},
    error::{Error, Result},
    transport::Connection,
};

/// Synchronous BOB client.
///
/// One command is outstanding at a time. Commands sent while disconnected
/// connect first. Nothing is retried: a failed command returns its error and
/// leaves the connection as it was.
///
/// ```rust,no_run
/// use i2p_bridge::{bob::BobClient, BridgeConfig};
///
/// # fn main() -> i2p_bridge::Result<()> {
/// let mut bob = BobClient::open(BridgeConfig::bob())?;
/// let destination = bob.setnick("foo")?.newkeys()?;
/// println!("{}", destination.b32_address());
/// bob.clear()?.quit()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BobClient {
    config: BridgeConfig,
    connection: Option<Connection>,
}

impl BobClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Creates a client and connects it.
    pub fn open(config: BridgeConfig) -> Result<Self> {
        let mut client = Self::new(config);
        client.connect()?;
        Ok(client)
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Connects and discards the two greeting lines. An existing connection
    /// is closed first.
    pub fn connect(&mut self) -> Result<&mut Self> {
        self.disconnect();
        let mut connection = Connection::open(&self.config)?;
        connection.read_line()?; // "BOB 00.00.10"
        connection.read_line()?; // "OK"
        self.connection = Some(connection);
        Ok(self)
    }

    pub fn reconnect(&mut self) -> Result<&mut Self> {
        self.connect()
    }

    /// Closes the connection. Does nothing if already closed.
    pub fn disconnect(&mut self) -> &mut Self {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        self
    }

    /// Sends `quit`, reads the farewell and disconnects whatever the reply.
    pub fn quit(&mut self) -> Result<&mut Self> {
        let result = self.command("quit", &[]).map(|_| ()); // "OK Bye!"
        self.disconnect();
        result?;
        Ok(self)
    }

    /// Asks the bridge whether `data` is a valid key pair or destination.
    ///
    /// Router errors mean "not valid" and come back as `false`; transport
    /// failures are still errors.
    pub fn verify(&mut self, data: &str) -> Result<bool> {
        match self.command("verify", &[&data]) {
            Ok(_) => Ok(true),
            Err(Error::Protocol(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// [`BobClient::verify`] on the text form of a structure.
    pub fn verify_structure<S: Structure>(&mut self, data: &S) -> Result<bool> {
        self.verify(&data.to_base64())
    }

    /// Creates a tunnel named `nickname` and selects it.
    pub fn setnick(&mut self, nickname: &str) -> Result<&mut Self> {
        self.command("setnick", &[&nickname])?; // "Nickname set to <nickname>"
        Ok(self)
    }

    /// Selects the existing tunnel named `nickname`.
    pub fn getnick(&mut self, nickname: &str) -> Result<&mut Self> {
        self.command("getnick", &[&nickname])?; // "Nickname set to <nickname>"
        Ok(self)
    }

    /// Selects `nickname`, creating the tunnel if `getnick` is refused.
    pub fn select_or_create(&mut self, nickname: &str) -> Result<&mut Self> {
        let exists = match self.getnick(nickname) {
            Ok(_) => true,
            Err(Error::Protocol(_)) => false,
            Err(e) => return Err(e),
        };
        if !exists {
            self.setnick(nickname)?;
        }
        Ok(self)
    }

    /// Generates a key pair for the current tunnel and returns its destination.
    pub fn newkeys(&mut self) -> Result<Destination> {
        let payload = self.command_payload("newkeys")?;
        Ok(Destination::parse(&payload)?)
    }

    /// Destination of the current tunnel.
    pub fn getdest(&mut self) -> Result<Destination> {
        let payload = self.command_payload("getdest")?;
        Ok(Destination::parse(&payload)?)
    }

    /// Full key pair of the current tunnel.
    pub fn getkeys(&mut self) -> Result<KeyPair> {
        let payload = self.command_payload("getkeys")?;
        Ok(KeyPair::parse(&payload)?)
    }

    /// Installs existing key material on the current tunnel.
    pub fn setkeys(&mut self, keys: &KeyPair) -> Result<&mut Self> {
        self.command("setkeys", &[&keys.to_base64()])?; // the base64 destination
        Ok(self)
    }

    /// Host the current tunnel listens on. New tunnels use `localhost`.
    pub fn inhost(&mut self, host: &str) -> Result<&mut Self> {
        self.command("inhost", &[&host])?; // "inhost set"
        Ok(self)
    }

    /// Port the current tunnel listens on.
    pub fn inport(&mut self, port: u16) -> Result<&mut Self> {
        self.command("inport", &[&port])?; // "inbound port set"
        Ok(self)
    }

    /// Host the current tunnel forwards to. New tunnels use `localhost`.
    pub fn outhost(&mut self, host: &str) -> Result<&mut Self> {
        self.command("outhost", &[&host])?; // "outhost set"
        Ok(self)
    }

    /// Port the current tunnel forwards to.
    pub fn outport(&mut self, port: u16) -> Result<&mut Self> {
        self.command("outport", &[&port])?; // "outbound port set"
        Ok(self)
    }

    /// Whether the incoming destination is withheld from listening sockets.
    ///
    /// Only outbound tunnels act on it. Inbound tunnels accept it too; what
    /// they do with it is up to the router.
    pub fn quiet(&mut self, quiet: bool) -> Result<&mut Self> {
        self.command("quiet", &[&quiet])?; // "Quiet set"
        Ok(self)
    }

    /// Sets an I2CP option on the current tunnel.
    pub fn option(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.command("option", &[&format!("{}={}", key, value)])?;
        Ok(self)
    }

    /// Activates the current tunnel. Fails if its settings are incomplete or
    /// it is already active.
    pub fn start(&mut self) -> Result<&mut Self> {
        self.command("start", &[])?; // "tunnel starting"
        Ok(self)
    }

    /// Deactivates the current tunnel.
    pub fn stop(&mut self) -> Result<&mut Self> {
        self.command("stop", &[])?; // "tunnel stopping"
        Ok(self)
    }

    /// Removes the current tunnel. It must be inactive.
    pub fn clear(&mut self) -> Result<&mut Self> {
        self.command("clear", &[])?; // "cleared"
        Ok(self)
    }

    fn command_payload(&mut self, verb: &str) -> Result<String> {
        self.command(verb, &[])?
            .ok_or_else(|| Error::malformed(format!("OK (no payload for {})", verb)))
    }

    /// Sends `<verb> [args...]` and reads one reply.
    fn command(&mut self, verb: &str, args: &[&dyn Display]) -> Result<Option<String>> {
        let mut line = verb.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.to_string());
        }

        if self.connection.is_none() {
            self.connect()?;
        }
        let connection = self
            .connection
            .as_mut()
            .ok_or(Error::ConnectionClosed)?;
        connection.send_line(&line)?;
        Reply::parse(&connection.read_line()?)?.into_result()
    }
}

impl Drop for BobClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
