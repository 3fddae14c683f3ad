//!
//! Common cryptographic operations
//!

use pkcs8::der::{self, asn1::UintRef, Decode, Reader, SliceReader};
use ring::signature::{Ed25519KeyPair, KeyPair, RsaKeyPair, ED25519_PUBLIC_KEY_LEN};
use strum::{AsRefStr, Display};

mod sign;
mod verify;

pub mod parse;

pub use self::sign::{sign, SignError};
pub use self::verify::{verify, VerifyError};

/// Type of an asymmetric key
#[derive(AsRefStr, Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum KeyType {
    /// Ed25519
    Ed25519,

    /// RSA
    Rsa,
}

/// Enum dispatch over the supported private keys
#[derive(Debug)]
#[non_exhaustive]
pub enum PrivateKey {
    /// Ed25519
    Ed25519(Ed25519KeyPair),

    /// RSA
    Rsa(RsaKeyPair),
}

impl PrivateKey {
    /// Type of the key
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(..) => KeyType::Ed25519,
            Self::Rsa(..) => KeyType::Rsa,
        }
    }

    /// Derive the public key belonging to this private key
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Ed25519(key) => PublicKey::Ed25519(key.public_key().as_ref().to_vec()),
            Self::Rsa(key) => PublicKey::Rsa(key.public().as_ref().to_vec()),
        }
    }
}

/// Enum dispatch over the supported public keys
///
/// RSA keys are stored as DER-encoded `RSAPublicKey` structures, Ed25519 keys as their raw 32 bytes
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PublicKey {
    /// Ed25519
    Ed25519(Vec<u8>),

    /// RSA
    Rsa(Vec<u8>),
}

impl PublicKey {
    /// Type of the key
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(..) => KeyType::Ed25519,
            Self::Rsa(..) => KeyType::Rsa,
        }
    }

    /// Whether the key bytes have the structure of their key type
    ///
    /// Doesn't check the mathematical validity of the key
    pub(crate) fn is_well_formed(&self) -> bool {
        match self {
            Self::Ed25519(bytes) => bytes.len() == ED25519_PUBLIC_KEY_LEN,
            Self::Rsa(der) => decode_rsa_public_key(der).is_ok(),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(bytes) | Self::Rsa(bytes) => bytes,
        }
    }
}

// RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }
fn decode_rsa_public_key(der: &[u8]) -> der::Result<()> {
    let mut reader = SliceReader::new(der)?;
    reader.sequence(|seq| {
        UintRef::decode(seq)?;
        UintRef::decode(seq)?;
        Ok(())
    })?;

    reader.finish(())
}
