//! Line-oriented TCP transport shared by the BOB and SAM clients.
//!
//! Both bridges speak newline-terminated ASCII: the client writes one command
//! line and then blocks reading exactly one reply line.
//!
//! Client                          Bridge
//!
//! <command> [args] ------------------->
//! <------------------------ <reply line>

use std::{
    io::{self, BufRead, BufReader, ErrorKind, Write},
    net::{Shutdown, TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{
    config::BridgeConfig,
    error::{Error, Result},
};

/// A connected bridge socket.
#[derive(Debug)]
pub(crate) struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    timeout: Option<Duration>,
    debug: bool,
}

impl Connection {
    pub fn open(config: &BridgeConfig) -> Result<Self> {
        let stream = connect(config)?;
        stream.set_read_timeout(config.timeout)?;
        stream.set_write_timeout(config.timeout)?;
        stream.set_nodelay(true)?;
        tracing::debug!(address = %config.address(), "connected to bridge");

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
            timeout: config.timeout,
            debug: config.debug,
        })
    }

    /// Writes `line` followed by a newline.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.echo("->", line);
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.writer
            .write_all(&buf)
            .and_then(|_| self.writer.flush())
            .map_err(|e| self.map_io(e))
    }

    /// Reads one line, without its terminator.
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| self.map_io(e))?;
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        self.echo("<-", &line);
        Ok(line)
    }

    /// Closes both directions. Errors are irrelevant at this point.
    pub fn close(self) {
        let _ = self.writer.shutdown(Shutdown::Both);
        tracing::debug!("disconnected from bridge");
    }

    fn echo(&self, direction: &str, line: &str) {
        if self.debug {
            tracing::debug!(target: "i2p_bridge::wire", "{} {}", direction, line);
        } else {
            tracing::trace!(target: "i2p_bridge::wire", "{} {}", direction, line);
        }
    }

    fn map_io(&self, error: io::Error) -> Error {
        map_io(error, self.timeout)
    }
}

/// Socket timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
fn map_io(error: io::Error, timeout: Option<Duration>) -> Error {
    match (error.kind(), timeout) {
        (ErrorKind::WouldBlock | ErrorKind::TimedOut, Some(timeout)) => Error::TimedOut(timeout),
        (ErrorKind::UnexpectedEof, _) => Error::ConnectionClosed,
        _ => Error::Io(error),
    }
}

fn connect(config: &BridgeConfig) -> Result<TcpStream> {
    let Some(timeout) = config.timeout else {
        return Ok(TcpStream::connect((config.host.as_str(), config.port))?);
    };

    let mut last_error = None;
    for addr in (config.host.as_str(), config.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(map_io(e, Some(timeout))),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        Error::InvalidConfig(format!("{} resolves to no address", config.address()))
    }))
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    use super::*;

    fn local_config(listener: &TcpListener) -> BridgeConfig {
        BridgeConfig::new("127.0.0.1", listener.local_addr().unwrap().port())
    }

    #[test]
    fn lines_are_framed_with_newlines() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = local_config(&listener);
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"first\r\nsecond\n").unwrap();
            let mut buf = [0u8; 8];
            stream.read_exact(&mut buf).unwrap();
            buf
        });

        let mut connection = Connection::open(&config).unwrap();
        assert_eq!(connection.read_line().unwrap(), "first");
        assert_eq!(connection.read_line().unwrap(), "second");
        connection.send_line("getdest").unwrap();
        assert_eq!(&server.join().unwrap(), b"getdest\n");
    }

    #[test]
    fn end_of_stream_is_connection_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = local_config(&listener);
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut connection = Connection::open(&config).unwrap();
        server.join().unwrap();
        assert!(matches!(connection.read_line(), Err(Error::ConnectionClosed)));
    }

    #[test]
    fn silent_bridge_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = local_config(&listener).with_timeout(Some(Duration::from_millis(100)));
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(500));
            drop(stream);
        });

        let mut connection = Connection::open(&config).unwrap();
        assert!(matches!(
            connection.read_line(),
            Err(Error::TimedOut(t)) if t == Duration::from_millis(100)
        ));
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = local_config(&listener);
        drop(listener);
        assert!(matches!(Connection::open(&config), Err(Error::Io(_))));
    }
}
