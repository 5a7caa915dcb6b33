//! Simple Anonymous Messaging (SAM) v3.
//!
//! The bridge sends nothing on connect. The first command must be the
//! version handshake:
//!
//! Client                                  Bridge
//!
//! HELLO VERSION MIN=3.0 MAX=3.0 ------------->
//! <------------ HELLO REPLY RESULT=OK VERSION=3.0
//! NAMING LOOKUP NAME=forum.i2p -------------->
//! <--- NAMING REPLY RESULT=OK NAME=forum.i2p VALUE=<base64>
//! DEST GENERATE ----------------------------->
//! <---------------- DEST REPLY PUB=<base64> PRIV=<base64>
//!
//! Replies are `<NOUN> REPLY [KEY=VALUE ...]`; values may be double-quoted.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use crate::error::{Error, ProtocolError, Result};

pub mod client;

pub use client::SamClient;

/// Version requested when the caller doesn't choose one.
pub const PROTOCOL_VERSION: Version = Version::new(3, 0);

/// A SAM protocol version, `<major>.<minor>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = Error;

    /// Accepts `3`, `3.0` and `3.1`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::malformed(format!("VERSION={}", s));
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

/// A successful SAM reply, tagged by noun.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `HELLO REPLY RESULT=OK VERSION=<v>`
    Hello { version: Version },
    /// `NAMING REPLY RESULT=OK NAME=<n> VALUE=<v>`
    Naming { name: String, value: String },
    /// `DEST REPLY PUB=<p> PRIV=<q>`
    Dest { public: String, private: String },
}

impl Reply {
    /// Parses one reply line. Non-`OK` results become the matching
    /// [`ProtocolError`]; unrecognized lines become [`ProtocolError::Router`]
    /// carrying the raw line.
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let noun = words.next().unwrap_or_default();
        if words.next() != Some("REPLY") {
            return Err(ProtocolError::Router(line.to_string()).into());
        }
        let rest = line
            .trim_start()
            .splitn(3, char::is_whitespace)
            .nth(2)
            .unwrap_or_default();
        let fields = parse_fields(rest);
        let field = |key: &str| fields.get(key).cloned();

        match noun {
            "HELLO" => match field("RESULT").as_deref() {
                Some("OK") => {
                    let version = field("VERSION").ok_or_else(|| Error::malformed(line))?;
                    Ok(Reply::Hello {
                        version: version.parse()?,
                    })
                }
                Some("NOVERSION") => Err(ProtocolError::ProtocolNotSupported(
                    "SAM bridge does not support the requested protocol version".into(),
                )
                .into()),
                Some(code) => Err(result_error(code, field("MESSAGE"), line)),
                None => Err(ProtocolError::Router(line.to_string()).into()),
            },
            "NAMING" => match field("RESULT").as_deref() {
                Some("OK") => match (field("NAME"), field("VALUE")) {
                    (Some(name), Some(value)) => Ok(Reply::Naming { name, value }),
                    _ => Err(Error::malformed(line)),
                },
                Some(code) => Err(result_error(
                    code,
                    field("NAME").or_else(|| field("MESSAGE")),
                    line,
                )),
                None => Err(ProtocolError::Router(line.to_string()).into()),
            },
            "DEST" => match (field("PUB"), field("PRIV")) {
                (Some(public), Some(private)) => Ok(Reply::Dest { public, private }),
                _ => match field("RESULT") {
                    Some(code) => Err(result_error(&code, field("MESSAGE"), line)),
                    None => Err(ProtocolError::Router(line.to_string()).into()),
                },
            },
            _ => Err(ProtocolError::Router(line.to_string()).into()),
        }
    }
}

fn result_error(code: &str, message: Option<String>, line: &str) -> Error {
    let message = message.unwrap_or_else(|| line.to_string());
    match ProtocolError::from_result_code(code, message) {
        Some(error) => error.into(),
        // RESULT=OK with fields missing for this noun
        None => Error::malformed(line),
    }
}

/// Splits `KEY=VALUE KEY="quoted value"` pairs. Words without `=` are kept
/// with an empty value.
fn parse_fields(input: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }

        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            if chars.next_if_eq(&'"').is_some() {
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        c => value.push(c),
                    }
                }
            } else {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
            }
        }
        fields.insert(key, value);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_ok_yields_version() {
        assert_eq!(
            Reply::parse("HELLO REPLY RESULT=OK VERSION=3.0").unwrap(),
            Reply::Hello {
                version: Version::new(3, 0)
            }
        );
        assert_eq!(
            Reply::parse("HELLO REPLY RESULT=OK VERSION=3.1").unwrap(),
            Reply::Hello {
                version: Version::new(3, 1)
            }
        );
    }

    #[test]
    fn hello_noversion_is_not_supported() {
        assert!(matches!(
            Reply::parse("HELLO REPLY RESULT=NOVERSION"),
            Err(Error::Protocol(ProtocolError::ProtocolNotSupported(_)))
        ));
    }

    #[test]
    fn hello_i2p_error_carries_message() {
        match Reply::parse(r#"HELLO REPLY RESULT=I2P_ERROR MESSAGE="Must start with HELLO VERSION""#) {
            Err(Error::Protocol(ProtocolError::Router(message))) => {
                assert_eq!(message, "Must start with HELLO VERSION")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn naming_results() {
        assert_eq!(
            Reply::parse("NAMING REPLY RESULT=OK NAME=forum.i2p VALUE=abc~-").unwrap(),
            Reply::Naming {
                name: "forum.i2p".into(),
                value: "abc~-".into()
            }
        );
        assert!(matches!(
            Reply::parse("NAMING REPLY RESULT=KEY_NOT_FOUND NAME=foobar.i2p"),
            Err(Error::Protocol(ProtocolError::KeyNotFound(name))) if name == "foobar.i2p"
        ));
        assert!(matches!(
            Reply::parse("NAMING REPLY RESULT=INVALID_KEY NAME=123"),
            Err(Error::Protocol(ProtocolError::KeyNotValid(name))) if name == "123"
        ));
    }

    #[test]
    fn dest_reply_has_both_keys() {
        assert_eq!(
            Reply::parse("DEST REPLY PUB=pub~ PRIV=priv-").unwrap(),
            Reply::Dest {
                public: "pub~".into(),
                private: "priv-".into()
            }
        );
    }

    #[test]
    fn unknown_lines_are_router_errors_with_the_raw_line() {
        for line in ["", "garbage", "STREAM STATUS RESULT=OK", "SESSION REPLY RESULT=OK"] {
            match Reply::parse(line) {
                Err(Error::Protocol(ProtocolError::Router(raw))) => assert_eq!(raw, line),
                other => panic!("{:?} gave {:?}", line, other),
            }
        }
    }

    #[test]
    fn other_result_codes_use_the_code_table() {
        assert!(matches!(
            Reply::parse("NAMING REPLY RESULT=TIMEOUT NAME=slow.i2p"),
            Err(Error::Protocol(ProtocolError::Timeout(_)))
        ));
        assert!(matches!(
            Reply::parse("DEST REPLY RESULT=I2P_ERROR MESSAGE=\"bad sig type\""),
            Err(Error::Protocol(ProtocolError::Router(m))) if m == "bad sig type"
        ));
    }

    #[test]
    fn fields_handle_quotes_and_bare_words() {
        let fields = parse_fields(r#"RESULT=OK MESSAGE="two words" FLAG NAME=a\b"#);
        assert_eq!(fields["RESULT"], "OK");
        assert_eq!(fields["MESSAGE"], "two words");
        assert_eq!(fields["FLAG"], "");
        assert_eq!(fields["NAME"], "a\\b");
    }

    #[test]
    fn version_parsing_and_display() {
        assert_eq!("3.0".parse::<Version>().unwrap(), Version::new(3, 0));
        assert_eq!("3".parse::<Version>().unwrap(), Version::new(3, 0));
        assert_eq!(Version::new(3, 1).to_string(), "3.1");
        assert!("three".parse::<Version>().is_err());
        assert!(Version::new(3, 1) > PROTOCOL_VERSION);
    }
}
