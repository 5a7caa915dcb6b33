//! I2P common data structures.
//!
//! All structures share one binary form (big-endian, fixed or self-delimiting
//! length) and one text form, the I2P flavour of Base64:
//!
//! ```text
//! standard:  A-Z a-z 0-9 + /
//! I2P:       A-Z a-z 0-9 - ~
//! ```
//!
//! Composite layout:
//!
//! ```text
//! KeyPair
//! +----------------------------------------------------+
//! | Destination                                        |
//! |  +-------------------+------------------+--------+ |
//! |  | PublicKey (256)   | SigningPubKey    | Cert   | |
//! |  |                   | (128)            | (3+n)  | |
//! |  +-------------------+------------------+--------+ |
//! +-------------------+--------------------------------+
//! | PrivateKey (256)  | SigningPrivateKey (20)         |
//! +-------------------+--------------------------------+
//! ```

use std::io::Read;

use base64::{
    alphabet::Alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

use crate::error::CodecError;

pub mod certificate;
pub mod destination;
pub mod key;
pub mod key_pair;

pub use certificate::{Certificate, CertificateType};
pub use destination::Destination;
pub use key::{
    Key, KeyKind, PrivateKey, PublicKey, SigningPrivateKey, SigningPublicKey,
};
pub use key_pair::KeyPair;

/// Base64 alphabet with `+` replaced by `-` and `/` by `~`.
pub const I2P_ALPHABET: Alphabet =
    match Alphabet::new("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-~") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("invalid I2P base64 alphabet"),
    };

/// Padded on output, padding optional on input.
pub const I2P_BASE64: GeneralPurpose = GeneralPurpose::new(
    &I2P_ALPHABET,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes in I2P Base64, without line breaks.
pub fn encode_base64(bytes: &[u8]) -> String {
    I2P_BASE64.encode(bytes)
}

/// Decodes I2P Base64 text.
///
/// Text in the standard alphabet is accepted as well: `+` and `/` are
/// mapped onto the I2P alphabet in a private copy before decoding.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, CodecError> {
    let text = text.trim();
    if text.contains(['+', '/']) {
        let normalized: String = text
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '~',
                c => c,
            })
            .collect();
        return Ok(I2P_BASE64.decode(normalized)?);
    }
    Ok(I2P_BASE64.decode(text)?)
}

/// Identifies the concrete type of a [`Structure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    PublicKey,
    PrivateKey,
    SigningPublicKey,
    SigningPrivateKey,
    Certificate,
    Destination,
    KeyPair,
}

/// A data structure with a binary wire form and an I2P Base64 text form.
pub trait Structure: Sized {
    const KIND: StructureKind;

    /// Reads one structure from `input`, consuming exactly its wire length.
    fn read<R: Read>(input: &mut R) -> Result<Self, CodecError>;

    /// Binary wire form.
    fn to_bytes(&self) -> Vec<u8>;

    /// Length of the binary wire form.
    fn byte_size(&self) -> usize;

    /// Reads a structure from the start of `bytes`. Trailing bytes are ignored.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut input = bytes;
        Self::read(&mut input)
    }

    /// Parses the I2P Base64 text form.
    fn parse(text: &str) -> Result<Self, CodecError> {
        Self::from_bytes(&decode_base64(text)?)
    }

    /// I2P Base64 text form.
    fn to_base64(&self) -> String {
        encode_base64(&self.to_bytes())
    }

    /// True if `other` has the same binary form, whatever its type.
    fn same_bytes<S: Structure>(&self, other: &S) -> bool {
        self.to_bytes() == other.to_bytes()
    }

    /// True if `other` is the same kind of structure with the same binary form.
    fn eql<S: Structure>(&self, other: &S) -> bool {
        Self::KIND == S::KIND && self.same_bytes(other)
    }
}

/// Reads exactly `len` bytes, reporting how many were available on a short
/// read. Reader errors are passed on as [`CodecError::Io`].
pub(crate) fn read_bytes<R: Read>(
    input: &mut R,
    len: usize,
    structure: &'static str,
) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(len);
    input.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(CodecError::TruncatedInput {
            structure,
            expected: len,
            available: buf.len(),
        });
    }
    Ok(buf)
}
