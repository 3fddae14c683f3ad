//!
//! Algorithm identities
//!
//! The signature algorithm and the body digest algorithm are configured independently.
//! They travel together as a [`SigningAlgorithm`] so neither half ever gets silently defaulted.
//!

use strum::{AsRefStr, Display, EnumString};

/// Asymmetric signature algorithm
///
/// The string forms are the identifiers used in the `algorithm` parameter of the `Signature` header
#[derive(AsRefStr, Clone, Copy, Debug, Default, Display, EnumString, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    #[default]
    #[strum(serialize = "rsa-sha256")]
    RsaSha256,

    /// RSASSA-PKCS1-v1_5 using SHA-512
    #[strum(serialize = "rsa-sha512")]
    RsaSha512,

    /// Ed25519 (the hash is part of the scheme)
    #[strum(serialize = "ed25519")]
    Ed25519,
}

/// Digest algorithm used for message bodies (the `Digest` header)
#[derive(AsRefStr, Clone, Copy, Debug, Default, Display, EnumString, Eq, Hash, PartialEq)]
#[strum(ascii_case_insensitive)]
#[non_exhaustive]
pub enum DigestAlgorithm {
    /// SHA-256
    #[default]
    #[strum(serialize = "SHA-256")]
    Sha256,

    /// SHA-512
    #[strum(serialize = "SHA-512")]
    Sha512,
}

impl DigestAlgorithm {
    /// Hash the data with this algorithm
    #[must_use]
    pub fn digest(self, data: &[u8]) -> ring::digest::Digest {
        let algorithm = match self {
            Self::Sha256 => &ring::digest::SHA256,
            Self::Sha512 => &ring::digest::SHA512,
        };

        ring::digest::digest(algorithm, data)
    }
}

/// Full algorithm identity of a signer
///
/// `rsa-sha512` paired with `SHA-256` is a different value than `rsa-sha512` paired with `SHA-512`
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SigningAlgorithm {
    /// Signature algorithm
    pub signature: SignatureAlgorithm,

    /// Body digest algorithm
    pub digest: DigestAlgorithm,
}

impl SigningAlgorithm {
    /// Pair up a signature and a digest algorithm
    #[must_use]
    pub const fn new(signature: SignatureAlgorithm, digest: DigestAlgorithm) -> Self {
        Self { signature, digest }
    }
}

impl From<SignatureAlgorithm> for SigningAlgorithm {
    fn from(signature: SignatureAlgorithm) -> Self {
        Self {
            signature,
            digest: DigestAlgorithm::default(),
        }
    }
}
