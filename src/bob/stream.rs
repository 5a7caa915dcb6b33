//! A TCP stream to a remote destination through a temporary BOB tunnel.
//!
//! Client              BOB inbound tunnel           Remote destination
//!
//! connect inhost:inport ---->
//! <base64 destination>\n --->  ---- I2P ---->
//! <=========== bytes ===========> <=========== bytes ===========>
//!
//! The tunnel belongs to the stream: it is created for it and stopped and
//! cleared when the stream is dropped.

use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpListener, TcpStream},
    sync::atomic::{AtomicU64, Ordering},
};

use super::Tunnel;
use crate::{
    config::{BridgeConfig, TunnelConfig},
    data::{Destination, Structure},
    error::Result,
};

const LOCAL_HOST: &str = "127.0.0.1";

static STREAM_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct BobStream {
    stream: TcpStream,
    tunnel: Tunnel,
    destination: Destination,
}

impl BobStream {
    /// Opens a tunnel on a free local port and connects through it to
    /// `destination`.
    ///
    /// The port is picked by binding and releasing it, so another process
    /// can take it in between; BOB offers no way around that.
    pub fn connect(destination: &Destination, bridge: BridgeConfig) -> Result<Self> {
        let port = free_local_port()?;
        let nickname = format!(
            "stream-{}-{}",
            std::process::id(),
            STREAM_ID.fetch_add(1, Ordering::Relaxed)
        );
        let tunnel = Tunnel::create(TunnelConfig::inbound(nickname, LOCAL_HOST, port), bridge)?;

        match open_through(&tunnel, destination, port) {
            Ok(stream) => Ok(Self {
                stream,
                tunnel,
                destination: destination.clone(),
            }),
            Err(e) => {
                if let Err(remove_error) = tunnel.remove() {
                    tracing::warn!(
                        nickname = tunnel.nickname(),
                        error = %remove_error,
                        "failed to remove tunnel after connect error"
                    );
                }
                Err(e)
            }
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn tunnel(&self) -> &Tunnel {
        &self.tunnel
    }

    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }
}

fn open_through(tunnel: &Tunnel, destination: &Destination, port: u16) -> Result<TcpStream> {
    tunnel.start()?;
    let mut stream = TcpStream::connect((LOCAL_HOST, port))?;
    let timeout = tunnel.bridge().timeout;
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;
    stream.write_all(format!("{}\n", destination.to_base64()).as_bytes())?;
    stream.flush()?;
    Ok(stream)
}

fn free_local_port() -> io::Result<u16> {
    let listener = TcpListener::bind((LOCAL_HOST, 0))?;
    Ok(listener.local_addr()?.port())
}

impl Read for BobStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for BobStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Drop for BobStream {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Err(e) = self.tunnel.remove() {
            tracing::warn!(nickname = self.tunnel.nickname(), error = %e, "failed to remove tunnel");
        }
    }
}
