use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use i2p_bridge::{
    bob::{BobClient, Tunnel},
    data::decode_base64,
    sam::{SamClient, Version},
    AddressBook, BridgeConfig, Destination, KeyPair, Structure, TunnelConfig,
};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Talk to the SAM v3 bridge
    #[command(subcommand)]
    Sam(SamCommands),
    /// Manage BOB tunnels
    #[command(subcommand)]
    Bob(BobCommands),
    /// Read the local hosts.txt address book
    #[command(subcommand)]
    Hosts(HostsCommands),
    /// Decode a base64 destination or key pair
    Inspect {
        /// I2P base64 text
        data: String,
    },
}

#[derive(Subcommand, Debug)]
enum SamCommands {
    /// Negotiate a protocol version
    Hello {
        #[arg(long)]
        min: Option<Version>,
        #[arg(long)]
        max: Option<Version>,
    },
    /// Resolve a hostname to its destination
    Lookup { name: String },
    /// Generate a new destination
    Generate,
}

#[derive(Subcommand, Debug)]
enum BobCommands {
    /// Check whether a base64 destination or key pair is valid
    Verify { data: String },
    /// Create or update a tunnel
    Create(CreateArgs),
    Start { nickname: String },
    Stop { nickname: String },
    /// Remove a stopped tunnel
    Clear { nickname: String },
    /// Print a tunnel's destination
    Dest { nickname: String },
    /// Print a tunnel's key pair
    Keys { nickname: String },
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Defaults to the current Unix time
    nickname: Option<String>,
    /// Existing key pair in base64
    #[arg(long)]
    keys: Option<String>,
    #[arg(long)]
    inhost: Option<String>,
    #[arg(long)]
    inport: Option<u16>,
    #[arg(long)]
    outhost: Option<String>,
    #[arg(long)]
    outport: Option<u16>,
    /// Don't send the incoming destination to the outbound socket
    #[arg(long)]
    quiet: bool,
    /// Start the tunnel once it is configured
    #[arg(long)]
    start: bool,
}

#[derive(Subcommand, Debug)]
enum HostsCommands {
    /// Look up a hostname
    Lookup {
        name: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print every entry
    List {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Bridge host, overrides I2P_BOB_HOST / I2P_SAM_HOST
    #[arg(long, global = true)]
    host: Option<String>,
    /// Bridge port, overrides I2P_BOB_PORT / I2P_SAM_PORT
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Seconds to wait for the bridge, 0 waits forever
    #[arg(long, global = true, env = "I2P_BRIDGE_TIMEOUT", default_value_t = 60)]
    timeout: u64,
    /// Log raw protocol lines
    #[arg(long, global = true)]
    debug: bool,
    /// SAM protocol version to request
    #[arg(long, global = true, default_value = "3.0")]
    sam_version: Version,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn bridge(&self, defaults: BridgeConfig) -> BridgeConfig {
        let mut config = defaults
            .with_timeout((self.timeout > 0).then(|| Duration::from_secs(self.timeout)))
            .with_debug(self.debug);
        if let Some(host) = &self.host {
            config = config.with_host(host.clone());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match &args.command {
        Commands::Sam(command) => {
            sam(command, args.bridge(BridgeConfig::sam()), args.sam_version)
        }
        Commands::Bob(command) => bob(command, args.bridge(BridgeConfig::bob())),
        Commands::Hosts(command) => hosts(command),
        Commands::Inspect { data } => inspect(data),
    }
}

fn sam(command: &SamCommands, config: BridgeConfig, version: Version) -> anyhow::Result<()> {
    let address = config.address();
    let mut client = SamClient::new(config).with_version(version);
    client
        .connect()
        .with_context(|| format!("connecting to SAM at {}", address))?;

    match command {
        SamCommands::Hello { min, max } => {
            let version = client.hello(*min, *max)?;
            println!("SAM {}", version);
        }
        SamCommands::Lookup { name } => {
            client.hello(None, None)?;
            let destination = client
                .lookup_destination(name)
                .with_context(|| format!("looking up {}", name))?;
            println!("{}", destination.b32_address());
            println!("{}", destination.to_base64());
        }
        SamCommands::Generate => {
            client.hello(None, None)?;
            let (private, public) = client.generate_dest()?;
            println!("public:  {}", public);
            println!("private: {}", private);
        }
    }
    Ok(())
}

fn bob(command: &BobCommands, config: BridgeConfig) -> anyhow::Result<()> {
    match command {
        BobCommands::Verify { data } => {
            let mut client = BobClient::open(config)?;
            let valid = client.verify(data)?;
            client.quit()?;
            println!("{}", if valid { "valid" } else { "invalid" });
            if !valid {
                std::process::exit(1);
            }
        }
        BobCommands::Create(create) => {
            let mut tunnel_config = TunnelConfig {
                nickname: create.nickname.clone(),
                inhost: create.inhost.clone(),
                inport: create.inport,
                outhost: create.outhost.clone(),
                outport: create.outport,
                quiet: create.quiet.then_some(true),
                ..Default::default()
            };
            if let Some(keys) = &create.keys {
                tunnel_config.keys = Some(KeyPair::parse(keys).context("decoding --keys")?);
            }

            let tunnel = Tunnel::create(tunnel_config, config)?;
            if create.start {
                tunnel.start()?;
            }
            let destination = tunnel.destination()?;
            println!("nickname: {}", tunnel.nickname());
            println!("address:  {}", destination.b32_address());
            println!("{}", destination.to_base64());
        }
        BobCommands::Start { nickname } => {
            Tunnel::attach(nickname, config)?.start()?;
        }
        BobCommands::Stop { nickname } => {
            Tunnel::attach(nickname, config)?.stop()?;
        }
        BobCommands::Clear { nickname } => {
            Tunnel::attach(nickname, config)?.clear()?;
        }
        BobCommands::Dest { nickname } => {
            let destination = Tunnel::attach(nickname, config)?.destination()?;
            println!("{}", destination.to_base64());
        }
        BobCommands::Keys { nickname } => {
            let keys = Tunnel::attach(nickname, config)?.keys()?;
            println!("{}", keys.to_base64());
        }
    }
    Ok(())
}

fn hosts(command: &HostsCommands) -> anyhow::Result<()> {
    let open = |file: &Option<PathBuf>| match file {
        Some(path) => AddressBook::open(path)
            .with_context(|| format!("reading {}", path.display())),
        None => AddressBook::open_default().context("reading ~/.i2p/hosts.txt"),
    };

    match command {
        HostsCommands::Lookup { name, file } => {
            let book = open(file)?;
            let Some(destination) = book.get(name) else {
                bail!("{} is not in the address book", name);
            };
            println!("{}", destination.b32_address());
            println!("{}", destination.to_base64());
        }
        HostsCommands::List { file } => {
            for (name, destination) in open(file)?.iter() {
                println!("{:<40} {}", name, destination.b32_address());
            }
        }
    }
    Ok(())
}

fn inspect(data: &str) -> anyhow::Result<()> {
    let bytes = decode_base64(data).context("decoding base64")?;

    if let Ok(keys) = KeyPair::from_bytes(&bytes) {
        if keys.byte_size() == bytes.len() {
            println!("key pair, {} bytes", bytes.len());
            print_destination(keys.destination());
            return Ok(());
        }
    }
    if let Ok(destination) = Destination::from_bytes(&bytes) {
        if destination.byte_size() == bytes.len() {
            println!("destination, {} bytes", bytes.len());
            print_destination(&destination);
            return Ok(());
        }
    }
    bail!(
        "{} bytes are neither a destination nor a key pair",
        bytes.len()
    )
}

fn print_destination(destination: &Destination) {
    println!("certificate: {}", destination.certificate());
    println!("hash:        {}", hex::encode(destination.hash()));
    println!("address:     {}", destination.b32_address());
}
