//! Basic Open Bridge (BOB).
//!
//! On connect the bridge greets before any command is sent:
//!
//! Client                          Bridge
//!
//! <------------------------- BOB 00.00.10
//! <------------------------------------ OK
//! setnick foo ------------------------->
//! <---------------- OK Nickname set to foo
//! newkeys ----------------------------->
//! <------------------ OK <base64 dest>
//!
//! The selected nickname lives on the bridge side of the connection; a new
//! connection has no tunnel selected until `setnick` or `getnick`.

use crate::error::{Error, ProtocolError, Result};

pub mod client;
pub mod stream;
pub mod tunnel;

pub use client::BobClient;
pub use stream::BobStream;
pub use tunnel::{ActiveTunnel, Tunnel};

/// Protocol version this client was written against.
pub const PROTOCOL_VERSION: u32 = 1;

/// A classified BOB reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OK` or `OK <payload>`, payload trimmed. An all-blank payload is `None`.
    Ok(Option<String>),
    /// `ERROR <message>`
    Error(String),
}

impl Reply {
    /// Classifies one reply line. Lines that are neither `OK` nor `ERROR`
    /// are malformed.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end();
        if let Some(rest) = keyword_rest(line, "OK") {
            let payload = rest.trim();
            return Ok(Reply::Ok((!payload.is_empty()).then(|| payload.to_string())));
        }
        if let Some(rest) = keyword_rest(line, "ERROR") {
            return Ok(Reply::Error(rest.trim().to_string()));
        }
        Err(Error::malformed(line))
    }

    /// Turns `ERROR` into a router error, keeping the `OK` payload.
    pub fn into_result(self) -> Result<Option<String>> {
        match self {
            Reply::Ok(payload) => Ok(payload),
            Reply::Error(message) => Err(ProtocolError::Router(message).into()),
        }
    }
}

/// `keyword` alone, or `keyword` followed by whitespace and the rest.
fn keyword_rest<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ok_has_no_payload() {
        assert_eq!(Reply::parse("OK").unwrap(), Reply::Ok(None));
        assert_eq!(Reply::parse("OK   ").unwrap(), Reply::Ok(None));
    }

    #[test]
    fn ok_payload_is_trimmed() {
        assert_eq!(
            Reply::parse("OK Nickname set to foo").unwrap(),
            Reply::Ok(Some("Nickname set to foo".into()))
        );
        assert_eq!(
            Reply::parse("OK   padded  ").unwrap(),
            Reply::Ok(Some("padded".into()))
        );
    }

    #[test]
    fn error_carries_message() {
        let reply = Reply::parse("ERROR tunnel nickname already exists").unwrap();
        assert_eq!(
            reply,
            Reply::Error("tunnel nickname already exists".into())
        );
        match reply.into_result() {
            Err(Error::Protocol(ProtocolError::Router(message))) => {
                assert_eq!(message, "tunnel nickname already exists")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn anything_else_is_malformed() {
        for line in ["", "BOB 00.00.10", "OKAY", "ERRORS here", "ok"] {
            assert!(
                matches!(Reply::parse(line), Err(Error::MalformedReply(_))),
                "{:?}",
                line
            );
        }
    }
}
