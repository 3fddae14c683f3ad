use super::{KeyType, PrivateKey};
use crate::algorithm::{SignatureAlgorithm, SigningAlgorithm};
use miette::Diagnostic;
use ring::{
    rand::SystemRandom,
    signature::{RsaEncoding, RsaKeyPair, RSA_PKCS1_SHA256, RSA_PKCS1_SHA512},
};
use thiserror::Error;

/// Signing error
#[derive(Debug, Diagnostic, Error)]
pub enum SignError {
    /// Cryptographic primitive failed
    #[error("Failed to sign message")]
    Crypto(#[from] ring::error::Unspecified),

    /// Key type can't be used with the algorithm
    #[error("Key of type `{key_type}` can't produce `{algorithm}` signatures")]
    KeyMismatch {
        /// Requested algorithm
        algorithm: SignatureAlgorithm,

        /// Type of the provided key
        key_type: KeyType,
    },
}

#[inline]
fn sign_rsa(
    key: &RsaKeyPair,
    padding: &'static dyn RsaEncoding,
    msg: &[u8],
) -> Result<Vec<u8>, SignError> {
    let mut buf = vec![0; key.public().modulus_len()];
    key.sign(padding, &SystemRandom::new(), msg, &mut buf)?;

    Ok(buf)
}

/// Sign a message with the signature half of the algorithm pair
///
/// The digest half names the body digest and doesn't change the signature primitive
#[inline]
pub fn sign(
    algorithm: SigningAlgorithm,
    key: &PrivateKey,
    msg: &[u8],
) -> Result<Vec<u8>, SignError> {
    match (algorithm.signature, key) {
        (SignatureAlgorithm::RsaSha256, PrivateKey::Rsa(key)) => {
            sign_rsa(key, &RSA_PKCS1_SHA256, msg)
        }
        (SignatureAlgorithm::RsaSha512, PrivateKey::Rsa(key)) => {
            sign_rsa(key, &RSA_PKCS1_SHA512, msg)
        }
        (SignatureAlgorithm::Ed25519, PrivateKey::Ed25519(key)) => {
            Ok(key.sign(msg).as_ref().to_vec())
        }
        (algorithm, key) => Err(SignError::KeyMismatch {
            algorithm,
            key_type: key.key_type(),
        }),
    }
}
