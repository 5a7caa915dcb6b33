use std::{fmt::Display, hash::Hash, io::Read, marker::PhantomData};

use super::{decode_base64, read_bytes, Structure, StructureKind};
use crate::error::CodecError;

/// A key variant: its fixed wire length and structure kind.
pub trait KeyKind {
    const BYTESIZE: usize;
    const KIND: StructureKind;
    const NAME: &'static str;
}

/// ElGamal public key, 256 bytes.
#[derive(Debug, Clone, Copy)]
pub enum Public {}

/// ElGamal private key, 256 bytes.
#[derive(Debug, Clone, Copy)]
pub enum Private {}

/// DSA-SHA1 signing public key, 128 bytes.
#[derive(Debug, Clone, Copy)]
pub enum SigningPublic {}

/// DSA-SHA1 signing private key, 20 bytes.
#[derive(Debug, Clone, Copy)]
pub enum SigningPrivate {}

impl KeyKind for Public {
    const BYTESIZE: usize = 256;
    const KIND: StructureKind = StructureKind::PublicKey;
    const NAME: &'static str = "PublicKey";
}

impl KeyKind for Private {
    const BYTESIZE: usize = 256;
    const KIND: StructureKind = StructureKind::PrivateKey;
    const NAME: &'static str = "PrivateKey";
}

impl KeyKind for SigningPublic {
    const BYTESIZE: usize = 128;
    const KIND: StructureKind = StructureKind::SigningPublicKey;
    const NAME: &'static str = "SigningPublicKey";
}

impl KeyKind for SigningPrivate {
    const BYTESIZE: usize = 20;
    const KIND: StructureKind = StructureKind::SigningPrivateKey;
    const NAME: &'static str = "SigningPrivateKey";
}

pub type PublicKey = Key<Public>;
pub type PrivateKey = Key<Private>;
pub type SigningPublicKey = Key<SigningPublic>;
pub type SigningPrivateKey = Key<SigningPrivate>;

/// Raw key material of variant `K`.
///
/// Decoded keys always have `K::BYTESIZE` bytes. Keys built with
/// [`Key::new`] keep whatever they were given and report it through
/// [`Key::is_valid`].
pub struct Key<K: KeyKind> {
    data: Vec<u8>,
    _kind: PhantomData<K>,
}

impl<K: KeyKind> Key<K> {
    /// Fixed wire length of this variant.
    pub const BYTESIZE: usize = K::BYTESIZE;

    /// Wraps raw bytes without checking their length.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            _kind: PhantomData,
        }
    }

    /// Decodes I2P Base64 and keeps every decoded byte.
    ///
    /// The bridges sometimes hand back larger structures where a key is
    /// expected (a whole destination for a "public key"); this keeps them
    /// intact instead of cutting them to `K::BYTESIZE`.
    pub fn from_base64_unchecked(text: &str) -> Result<Self, CodecError> {
        Ok(Self::new(decode_base64(text)?))
    }

    /// True if the key holds exactly `K::BYTESIZE` bytes.
    pub fn is_valid(&self) -> bool {
        self.data.len() == K::BYTESIZE
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl<K: KeyKind> Structure for Key<K> {
    const KIND: StructureKind = K::KIND;

    fn read<R: Read>(input: &mut R) -> Result<Self, CodecError> {
        Ok(Self::new(read_bytes(input, K::BYTESIZE, K::NAME)?))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// The variant's fixed length, even for an invalid key.
    fn byte_size(&self) -> usize {
        K::BYTESIZE
    }
}

impl<K: KeyKind> Clone for Key<K> {
    fn clone(&self) -> Self {
        Self::new(self.data.clone())
    }
}

impl<K: KeyKind> PartialEq for Key<K> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<K: KeyKind> Eq for Key<K> {}

impl<K: KeyKind> Hash for Key<K> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl<K: KeyKind> std::fmt::Debug for Key<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(K::NAME)
            .field("len", &self.data.len())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<K: KeyKind> Display for Key<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl<K: KeyKind> TryFrom<&[u8]> for Key<K> {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}
