use super::{Reply, Version, PROTOCOL_VERSION};
use crate::{
    config::BridgeConfig,
    data::{Destination, PrivateKey, PublicKey, Structure},
    error::{Error, Result},
    transport::Connection,
};

/// Synchronous SAM v3 client.
///
/// `HELLO` has to be the first command on a connection. [`SamClient::open`]
/// connects and sends it; after a manual [`SamClient::connect`] call
/// [`SamClient::hello`] yourself.
///
/// ```rust,no_run
/// use i2p_bridge::{sam::SamClient, BridgeConfig};
///
/// # fn main() -> i2p_bridge::Result<()> {
/// let mut sam = SamClient::open(BridgeConfig::sam())?;
/// let destination = sam.lookup_destination("forum.i2p")?;
/// println!("{}", destination.b32_address());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SamClient {
    config: BridgeConfig,
    /// Sent as both bounds when `hello` gets none.
    requested: Version,
    version: Option<Version>,
    connection: Option<Connection>,
}

impl SamClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            requested: PROTOCOL_VERSION,
            version: None,
            connection: None,
        }
    }

    /// Connects and negotiates [`PROTOCOL_VERSION`].
    pub fn open(config: BridgeConfig) -> Result<Self> {
        Self::open_with_version(config, PROTOCOL_VERSION)
    }

    /// Connects and negotiates `version`.
    pub fn open_with_version(config: BridgeConfig, version: Version) -> Result<Self> {
        let mut client = Self::new(config).with_version(version);
        client.connect()?;
        client.hello(None, None)?;
        Ok(client)
    }

    /// Sets the version `hello` asks for when called without bounds.
    pub fn with_version(mut self, version: Version) -> Self {
        self.requested = version;
        self
    }

    pub fn requested_version(&self) -> Version {
        self.requested
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

    /// Version agreed by the last successful `HELLO` on this connection.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens a fresh connection, closing any existing one. The bridge sends
    /// no greeting, so nothing is read.
    pub fn connect(&mut self) -> Result<&mut Self> {
        self.disconnect();
        self.connection = Some(Connection::open(&self.config)?);
        Ok(self)
    }

    pub fn reconnect(&mut self) -> Result<&mut Self> {
        self.connect()
    }

    pub fn disconnect(&mut self) -> &mut Self {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        self.version = None;
        self
    }

    /// Negotiates a protocol version between `min` and `max`, both defaulting
    /// to the requested version, and returns the one the bridge picked.
    pub fn hello(&mut self, min: Option<Version>, max: Option<Version>) -> Result<Version> {
        let min = min.unwrap_or(self.requested);
        let max = max.unwrap_or(self.requested);
        if min > max {
            return Err(Error::InvalidConfig(format!(
                "minimum version {} is above maximum {}",
                min, max
            )));
        }

        match self.command(&format!("HELLO VERSION MIN={} MAX={}", min, max))? {
            Reply::Hello { version } => {
                tracing::debug!(%version, "SAM handshake complete");
                self.version = Some(version);
                Ok(version)
            }
            other => Err(unexpected("HELLO", other)),
        }
    }

    /// Resolves `name` to the text form of its destination's public key.
    ///
    /// Routers answer with the whole destination, which is longer than a bare
    /// public key. The value is decoded without checking its length; use
    /// [`SamClient::lookup_destination`] for a parsed destination.
    pub fn lookup_name(&mut self, name: &str) -> Result<PublicKey> {
        let value = self.naming_lookup(name)?;
        Ok(PublicKey::from_base64_unchecked(&value)?)
    }

    /// Resolves `name` and decodes the reply as a full destination.
    pub fn lookup_destination(&mut self, name: &str) -> Result<Destination> {
        let value = self.naming_lookup(name)?;
        Ok(Destination::parse(&value)?)
    }

    /// Asks the router for a new destination. Returns the private half
    /// first, then the public half.
    pub fn generate_dest(&mut self) -> Result<(PrivateKey, PublicKey)> {
        match self.command("DEST GENERATE")? {
            Reply::Dest { public, private } => Ok((
                PrivateKey::from_base64_unchecked(&private)?,
                PublicKey::from_base64_unchecked(&public)?,
            )),
            other => Err(unexpected("DEST", other)),
        }
    }

    fn naming_lookup(&mut self, name: &str) -> Result<String> {
        match self.command(&format!("NAMING LOOKUP NAME={}", name))? {
            Reply::Naming { value, .. } => Ok(value),
            other => Err(unexpected("NAMING", other)),
        }
    }

    /// Sends one command line and parses the reply.
    fn command(&mut self, line: &str) -> Result<Reply> {
        if self.connection.is_none() {
            self.connect()?;
        }
        let connection = self
            .connection
            .as_mut()
            .ok_or(Error::ConnectionClosed)?;
        connection.send_line(line)?;
        Reply::parse(&connection.read_line()?)
    }
}

fn unexpected(noun: &str, reply: Reply) -> Error {
    Error::malformed(format!("expected {} REPLY, got {:?}", noun, reply))
}

impl Drop for SamClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
