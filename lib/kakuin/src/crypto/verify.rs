use super::{KeyType, PublicKey};
use crate::algorithm::{SignatureAlgorithm, SigningAlgorithm};
use miette::Diagnostic;
use ring::signature::{
    UnparsedPublicKey, VerificationAlgorithm, ED25519, RSA_PKCS1_2048_8192_SHA256,
    RSA_PKCS1_2048_8192_SHA512,
};
use thiserror::Error;

/// Verification error
///
/// A signature that simply doesn't match is not an error
#[derive(Debug, Diagnostic, Error)]
pub enum VerifyError {
    /// Key type can't verify signatures of the algorithm
    #[error("Key of type `{key_type}` can't verify `{algorithm}` signatures")]
    KeyMismatch {
        /// Requested algorithm
        algorithm: SignatureAlgorithm,

        /// Type of the provided key
        key_type: KeyType,
    },

    /// Key bytes don't have the structure of their key type
    #[error("Malformed `{0}` public key")]
    MalformedKey(KeyType),
}

/// Verify that the message corresponds with the signature using the provided public key
///
/// Returns `Ok(false)` if the signature doesn't match.
/// Fails if the key can't verify the algorithm or isn't structurally valid.
#[inline]
pub fn verify(
    algorithm: SigningAlgorithm,
    key: &PublicKey,
    msg: &[u8],
    signature: &[u8],
) -> Result<bool, VerifyError> {
    let verify_algo: &'static dyn VerificationAlgorithm = match (algorithm.signature, key.key_type())
    {
        (SignatureAlgorithm::RsaSha256, KeyType::Rsa) => &RSA_PKCS1_2048_8192_SHA256,
        (SignatureAlgorithm::RsaSha512, KeyType::Rsa) => &RSA_PKCS1_2048_8192_SHA512,
        (SignatureAlgorithm::Ed25519, KeyType::Ed25519) => &ED25519,
        (algorithm, key_type) => return Err(VerifyError::KeyMismatch { algorithm, key_type }),
    };

    if !key.is_well_formed() {
        return Err(VerifyError::MalformedKey(key.key_type()));
    }

    let is_valid = UnparsedPublicKey::new(verify_algo, key.as_bytes())
        .verify(msg, signature)
        .is_ok();

    Ok(is_valid)
}
