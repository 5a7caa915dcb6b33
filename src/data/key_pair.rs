use std::{fmt::Display, io::Read};

use super::{Destination, PrivateKey, SigningPrivateKey, Structure, StructureKind};
use crate::error::CodecError;

/// Key pair (private key file layout)
/// +----+----+----+----+----+----+----+----+
/// |                                       |
/// ~     destination (387 or more bytes)   ~
/// |                                       |
/// +----+----+----+----+----+----+----+----+
/// |                                       |
/// ~         private_key (256 bytes)       ~
/// |                                       |
/// +----+----+----+----+----+----+----+----+
/// |      signing_key (20 bytes)           |
/// +----+----+----+----+----+              +
///
/// The public address together with the private material needed to run it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPair {
    destination: Destination,
    private_key: PrivateKey,
    signing_key: SigningPrivateKey,
}

impl KeyPair {
    /// Smallest possible key pair.
    pub const MIN_BYTESIZE: usize = Destination::MIN_BYTESIZE + 256 + 20;

    /// As with [`Destination::new`], the size law only holds when every key
    /// here and in `destination` is valid.
    pub fn new(
        destination: Destination,
        private_key: PrivateKey,
        signing_key: SigningPrivateKey,
    ) -> Self {
        Self {
            destination,
            private_key,
            signing_key,
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn signing_key(&self) -> &SigningPrivateKey {
        &self.signing_key
    }

    pub fn into_destination(self) -> Destination {
        self.destination
    }
}

impl Structure for KeyPair {
    const KIND: StructureKind = StructureKind::KeyPair;

    fn read<R: Read>(input: &mut R) -> Result<Self, CodecError> {
        let destination = Destination::read(input)?;
        let private_key = PrivateKey::read(input)?;
        let signing_key = SigningPrivateKey::read(input)?;
        Ok(Self::new(destination, private_key, signing_key))
    }

    fn to_bytes(&self) -> Vec<u8> {
        [
            self.destination.to_bytes().as_slice(),
            self.private_key.as_bytes(),
            self.signing_key.as_bytes(),
        ]
        .concat()
    }

    fn byte_size(&self) -> usize {
        self.destination.byte_size() + self.private_key.byte_size() + self.signing_key.byte_size()
    }
}

impl TryFrom<&[u8]> for KeyPair {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl Display for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}
