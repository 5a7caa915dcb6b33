use std::{fmt::Display, io::Read};

use super::{read_bytes, Structure, StructureKind};
use crate::error::CodecError;

/// Certificate type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CertificateType {
    #[default]
    Null,
    Hashcash,
    Hidden,
    Signed,
    Multiple,
    /// A code this crate doesn't interpret. Round-trips unchanged.
    Unknown(u8),
}

impl From<u8> for CertificateType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Null,
            1 => Self::Hashcash,
            2 => Self::Hidden,
            3 => Self::Signed,
            4 => Self::Multiple,
            code => Self::Unknown(code),
        }
    }
}

impl From<CertificateType> for u8 {
    fn from(kind: CertificateType) -> Self {
        match kind {
            CertificateType::Null => 0,
            CertificateType::Hashcash => 1,
            CertificateType::Hidden => 2,
            CertificateType::Signed => 3,
            CertificateType::Multiple => 4,
            CertificateType::Unknown(code) => code,
        }
    }
}

/// Certificate
/// All fields are big-endian
/// +----+----+----+----+----+-//
/// |type| length  | payload
/// +----+----+----+----+----+-//
///
/// A zero length still writes both length bytes, so the smallest
/// certificate is 3 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Certificate {
    kind: CertificateType,
    payload: Vec<u8>,
}

impl Certificate {
    /// Largest payload the 2-byte length field can describe.
    pub const MAX_PAYLOAD: usize = u16::MAX as usize;

    /// Fails if `payload` is longer than [`Certificate::MAX_PAYLOAD`].
    pub fn new(kind: CertificateType, payload: impl Into<Vec<u8>>) -> Result<Self, CodecError> {
        let payload = payload.into();
        if payload.len() > Self::MAX_PAYLOAD {
            return Err(CodecError::PayloadTooLarge {
                len: payload.len(),
                max: Self::MAX_PAYLOAD,
            });
        }
        Ok(Self { kind, payload })
    }

    /// 1 byte, certificate type
    pub fn kind(&self) -> CertificateType {
        self.kind
    }

    /// 0 - 65535 bytes, interpretation depends on the type
    pub fn payload(&self) -> &[u8] {
        self.payload.as_slice()
    }
}

impl Structure for Certificate {
    const KIND: StructureKind = StructureKind::Certificate;

    fn read<R: Read>(input: &mut R) -> Result<Self, CodecError> {
        let header = read_bytes(input, 3, "Certificate")?;
        let len = u16::from_be_bytes([header[1], header[2]]) as usize;
        let payload = if len == 0 {
            Vec::new()
        } else {
            read_bytes(input, len, "Certificate payload")?
        };
        Ok(Self {
            kind: header[0].into(),
            payload,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        // `new` and `read` both keep the payload within u16
        let mut buf = Vec::with_capacity(self.byte_size());
        buf.push(self.kind.into());
        buf.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    fn byte_size(&self) -> usize {
        3 + self.payload.len()
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl Display for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Certificate (type: {}, payload_len: {})",
            u8::from(self.kind),
            self.payload.len()
        )
    }
}
