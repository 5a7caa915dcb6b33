//! Clients for the I2P router's BOB and SAM v3 bridges, and the binary and
//! Base64 codec for the I2P structures they exchange.
//!
//! ```rust,no_run
//! use i2p_bridge::{bob::Tunnel, BridgeConfig, TunnelConfig};
//!
//! # fn main() -> i2p_bridge::Result<()> {
//! let tunnel = Tunnel::create(
//!     TunnelConfig::outbound("website", "127.0.0.1", 8080),
//!     BridgeConfig::bob(),
//! )?;
//! println!("{}", tunnel.destination()?.b32_address());
//! tunnel.run(|_| std::thread::park())?;
//! # Ok(())
//! # }
//! ```

pub mod bob;
pub mod config;
pub mod data;
pub mod error;
pub mod hosts;
pub mod sam;
pub(crate) mod transport;


pub use config::{BridgeConfig, TunnelConfig};
pub use data::{
    Certificate, CertificateType, Destination, KeyPair, PrivateKey, PublicKey, SigningPrivateKey,
    SigningPublicKey, Structure,
};
pub use error::{CodecError, Error, ProtocolError, Result};
pub use hosts::AddressBook;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use crate::{
        bob::{BobClient, BobStream, Tunnel},
        sam::{SamClient, Version},
        test::{random_destination, random_key_pair, MockBob, MockSam},
        BridgeConfig, Error, ProtocolError, Structure, TunnelConfig,
    };

    #[test]
    fn tunnel_lifecycle() {
        let bob = MockBob::spawn();
        let tunnel = Tunnel::create(
            TunnelConfig::outbound("echo", "127.0.0.1", 8080),
            bob.config(),
        )
        .unwrap();

        let state = bob.tunnel("echo").unwrap();
        assert!(state.keys.is_some());
        assert_eq!(state.outport, Some(8080));
        assert_eq!(state.inport, None);

        tunnel.start().unwrap();
        assert!(bob.tunnel("echo").unwrap().running);
        assert!(matches!(
            tunnel.start(),
            Err(Error::Protocol(ProtocolError::Router(_)))
        ));
        assert!(tunnel.clear().is_err(), "active tunnels can't be cleared");

        tunnel.stop().unwrap();
        tunnel.clear().unwrap();
        assert!(bob.tunnel("echo").is_none());
        assert!(matches!(
            tunnel.destination(),
            Err(Error::Protocol(ProtocolError::Router(_)))
        ));
        assert!(Tunnel::attach("echo", bob.config()).is_err());
    }

    #[test]
    fn tunnel_accessors_read_from_the_bridge() {
        let bob = MockBob::spawn();
        let keys = random_key_pair(0);
        let tunnel = Tunnel::create(
            TunnelConfig::inbound("keyed", "127.0.0.1", 1).with_keys(keys.clone()),
            bob.config(),
        )
        .unwrap();

        assert_eq!(tunnel.keys().unwrap(), keys);
        assert_eq!(&tunnel.destination().unwrap(), keys.destination());

        tunnel.option("inbound.length", "1").unwrap();
        assert_eq!(
            bob.tunnel("keyed").unwrap().options,
            ["inbound.length=1"]
        );
    }

    #[test]
    fn create_selects_an_existing_tunnel_and_keeps_its_keys() {
        let bob = MockBob::spawn();
        let first = Tunnel::create(TunnelConfig::new("shared"), bob.config()).unwrap();
        let keys = first.keys().unwrap();

        let second = Tunnel::create(TunnelConfig::new("shared").with_quiet(true), bob.config())
            .unwrap();
        assert_eq!(second.keys().unwrap(), keys);
        assert!(bob.tunnel("shared").unwrap().quiet);
        let created = bob
            .commands()
            .iter()
            .filter(|c| *c == "setnick shared")
            .count();
        assert_eq!(created, 1);
    }

    #[test]
    fn active_tunnel_stops_on_drop() {
        let bob = MockBob::spawn();
        let tunnel = Tunnel::create(TunnelConfig::new("guarded"), bob.config()).unwrap();

        {
            let active = tunnel.activate().unwrap();
            assert_eq!(active.tunnel().nickname(), "guarded");
            assert!(bob.tunnel("guarded").unwrap().running);
        }
        assert!(!bob.tunnel("guarded").unwrap().running);

        let value = tunnel
            .run(|t| {
                assert!(bob.tunnel(t.nickname()).unwrap().running);
                42
            })
            .unwrap();
        assert_eq!(value, 42);
        assert!(!bob.tunnel("guarded").unwrap().running);

        tunnel.remove().unwrap();
        assert!(bob.tunnel("guarded").is_none());
    }

    #[test]
    fn remove_stops_a_running_tunnel_first() {
        let bob = MockBob::spawn();
        let tunnel = Tunnel::create(TunnelConfig::new("busy"), bob.config()).unwrap();
        tunnel.start().unwrap();
        tunnel.remove().unwrap();
        assert!(bob.tunnel("busy").is_none());
    }

    #[test]
    fn bob_verify_against_the_bridge() {
        let bob = MockBob::spawn();
        let mut client = BobClient::open(bob.config()).unwrap();
        let keys = random_key_pair(0);

        assert!(client.verify_structure(&keys).unwrap());
        assert!(client.verify_structure(keys.destination()).unwrap());
        assert!(!client.verify("garbage").unwrap());
        client.quit().unwrap();
        assert!(!client.is_connected());
    }

    #[test]
    fn bob_stream_carries_bytes_and_removes_its_tunnel() {
        let bob = MockBob::spawn();
        let destination = random_destination(0);

        let mut stream = BobStream::connect(&destination, bob.config()).unwrap();
        let nickname = stream.tunnel().nickname().to_string();
        assert!(bob.tunnel(&nickname).unwrap().running);

        stream.write_all(b"ping\n").unwrap();
        let mut echo = [0u8; 5];
        stream.read_exact(&mut echo).unwrap();
        assert_eq!(&echo, b"ping\n");
        assert_eq!(bob.stream_lines(), [destination.to_base64()]);
        assert_eq!(stream.destination(), &destination);

        drop(stream);
        assert!(bob.tunnel(&nickname).is_none());
    }

    #[test]
    fn sam_session() {
        let forum = random_destination(0);
        let sam = MockSam::spawn(&[("forum.i2p", forum.clone())]);

        let mut client = SamClient::open(sam.config()).unwrap();
        assert_eq!(client.version(), Some(Version::new(3, 0)));

        assert_eq!(client.lookup_destination("forum.i2p").unwrap(), forum);
        let key = client.lookup_name("forum.i2p").unwrap();
        assert_eq!(key.as_bytes(), forum.to_bytes().as_slice());

        assert!(matches!(
            client.lookup_name("foobar.i2p"),
            Err(Error::Protocol(ProtocolError::KeyNotFound(name))) if name == "foobar.i2p"
        ));
        assert!(matches!(
            client.lookup_name("123"),
            Err(Error::Protocol(ProtocolError::KeyNotValid(_)))
        ));

        let (private, public) = client.generate_dest().unwrap();
        assert!(private.as_bytes().len() > public.as_bytes().len());
        assert_eq!(
            &private.as_bytes()[..public.as_bytes().len()],
            public.as_bytes()
        );
    }

    #[test]
    fn sam_version_negotiation() {
        let sam = MockSam::spawn(&[]);
        let mut client = SamClient::new(sam.config());
        client.connect().unwrap();

        assert_eq!(
            client
                .hello(Some(Version::new(3, 0)), Some(Version::new(3, 1)))
                .unwrap(),
            Version::new(3, 1)
        );

        client.reconnect().unwrap();
        assert_eq!(client.version(), None);
        assert!(matches!(
            client.hello(Some(Version::new(3, 2)), Some(Version::new(3, 3))),
            Err(Error::Protocol(ProtocolError::ProtocolNotSupported(_)))
        ));
    }

    #[test]
    fn sam_open_with_a_newer_version() {
        let sam = MockSam::spawn(&[]);
        let client = SamClient::open_with_version(sam.config(), Version::new(3, 1)).unwrap();
        assert_eq!(client.version(), Some(Version::new(3, 1)));
    }

    #[test]
    fn sam_commands_before_hello_are_refused() {
        let sam = MockSam::spawn(&[]);
        let mut client = SamClient::new(sam.config());
        assert!(matches!(
            client.generate_dest(),
            Err(Error::Protocol(ProtocolError::Router(m))) if m == "Must start with HELLO VERSION"
        ));
    }

    #[test]
    fn nothing_listening_is_an_io_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = BridgeConfig::new("127.0.0.1", port);
        assert!(matches!(BobClient::open(config.clone()), Err(Error::Io(_))));
        assert!(matches!(SamClient::open(config), Err(Error::Io(_))));
    }
}
