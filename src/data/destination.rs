use std::{fmt::Display, io::Read};

use sha2::{Digest, Sha256};

use super::{Certificate, PublicKey, SigningPublicKey, Structure, StructureKind};
use crate::error::CodecError;

/// Destination
/// +----+----+----+----+----+----+----+----+
/// |                                       |
/// ~          public_key (256 bytes)       ~
/// |                                       |
/// +----+----+----+----+----+----+----+----+
/// |                                       |
/// ~         signing_key (128 bytes)       ~
/// |                                       |
/// +----+----+----+----+----+----+----+----+
/// |   certificate (3 or more bytes)       |
/// ~                                       ~
/// +----+----+----+----+----+----+----+----+
///
/// An endpoint in the I2P network. Two destinations are equal when their
/// binary forms are identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    public_key: PublicKey,
    signing_key: SigningPublicKey,
    certificate: Certificate,
}

impl Destination {
    /// Smallest possible destination: both keys and a null certificate.
    pub const MIN_BYTESIZE: usize = 387;

    /// Both keys must pass [`Key::is_valid`](super::key::Key::is_valid) for
    /// `byte_size` to match the length of `to_bytes`. A key of the wrong
    /// length is written as is and the result won't read back.
    pub fn new(
        public_key: PublicKey,
        signing_key: SigningPublicKey,
        certificate: Certificate,
    ) -> Self {
        Self {
            public_key,
            signing_key,
            certificate,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn signing_key(&self) -> &SigningPublicKey {
        &self.signing_key
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// SHA-256 of the binary form.
    pub fn hash(&self) -> [u8; 32] {
        Sha256::digest(self.to_bytes()).into()
    }

    /// `<base32 hash>.b32.i2p`
    pub fn b32_address(&self) -> String {
        format!("{}.b32.i2p", base32_lower(&self.hash()))
    }
}

impl Structure for Destination {
    const KIND: StructureKind = StructureKind::Destination;

    fn read<R: Read>(input: &mut R) -> Result<Self, CodecError> {
        let public_key = PublicKey::read(input)?;
        let signing_key = SigningPublicKey::read(input)?;
        let certificate = Certificate::read(input)?;
        Ok(Self::new(public_key, signing_key, certificate))
    }

    fn to_bytes(&self) -> Vec<u8> {
        [
            self.public_key.as_bytes(),
            self.signing_key.as_bytes(),
            self.certificate.to_bytes().as_slice(),
        ]
        .concat()
    }

    fn byte_size(&self) -> usize {
        self.public_key.byte_size() + self.signing_key.byte_size() + self.certificate.byte_size()
    }
}

impl TryFrom<&[u8]> for Destination {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// RFC 4648 base32, lowercase, unpadded.
fn base32_lower(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

    let mut out = String::with_capacity((bytes.len() * 8 + 4) / 5);
    let mut buffer: u16 = 0;
    let mut bits = 0;
    for &byte in bytes {
        buffer = (buffer << 8) | byte as u16;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}
