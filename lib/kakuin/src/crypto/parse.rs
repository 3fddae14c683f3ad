//!
//! Parse cryptographic keys from their PEM forms
//!
//! Currently supported algorithms:
//!
//! - RSA
//! - Ed25519
//!

use super::{PrivateKey, PublicKey};
use const_oid::db::{rfc5912::RSA_ENCRYPTION, rfc8410::ID_ED_25519};
use miette::Diagnostic;
use pkcs8::{
    Document, EncryptedPrivateKeyInfo, PrivateKeyInfo, SecretDocument, SubjectPublicKeyInfoRef,
};
use ring::signature::{Ed25519KeyPair, RsaKeyPair};
use thiserror::Error;

const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// Key parsing error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Malformed DER structure
    #[error(transparent)]
    Der(#[from] pkcs8::der::Error),

    /// Private key is encrypted but no password was provided
    #[error("Private key is encrypted")]
    Encrypted,

    /// Key rejected
    #[error(transparent)]
    KeyRejected(#[from] ring::error::KeyRejected),

    /// Malformed key
    #[error("Malformed key")]
    MalformedKey,

    /// Malformed PKCS#8 document
    #[error(transparent)]
    Pkcs8(#[from] pkcs8::Error),

    /// Unknown key type
    #[error("Unknown key type")]
    UnknownKeyType,
}

/// Parse a public key from its SPKI PEM form
#[inline]
pub fn public_key(pem: &str) -> Result<PublicKey, Error> {
    let (_pem_tag, document) = Document::from_pem(pem)?;
    let spki: SubjectPublicKeyInfoRef<'_> = document.decode_msg()?;

    let raw_bytes = spki
        .subject_public_key
        .as_bytes()
        .ok_or(Error::MalformedKey)?
        .to_vec();

    let public_key = if spki.algorithm.oid == RSA_ENCRYPTION {
        PublicKey::Rsa(raw_bytes)
    } else if spki.algorithm.oid == ID_ED_25519 {
        PublicKey::Ed25519(raw_bytes)
    } else {
        return Err(Error::UnknownKeyType);
    };

    if !public_key.is_well_formed() {
        return Err(Error::MalformedKey);
    }

    Ok(public_key)
}

fn decode_private_key(document: &SecretDocument) -> Result<PrivateKey, Error> {
    let private_key_raw: PrivateKeyInfo<'_> = document.decode_msg()?;

    let signing_key = if private_key_raw.algorithm.oid == RSA_ENCRYPTION {
        PrivateKey::Rsa(RsaKeyPair::from_der(private_key_raw.private_key)?)
    } else if private_key_raw.algorithm.oid == ID_ED_25519 {
        // Accepts both v1 (seed only) and v2 (seed and public key) documents
        PrivateKey::Ed25519(Ed25519KeyPair::from_pkcs8_maybe_unchecked(
            document.as_bytes(),
        )?)
    } else {
        return Err(Error::UnknownKeyType);
    };

    Ok(signing_key)
}

/// Parse a private key from its unencrypted PKCS#8 PEM form.
/// The decoded document is zeroized on drop.
#[inline]
pub fn private_key(pem: &str) -> Result<PrivateKey, Error> {
    let (tag_line, document) = SecretDocument::from_pem(pem)?;
    if tag_line == ENCRYPTED_PRIVATE_KEY_LABEL {
        return Err(Error::Encrypted);
    }

    decode_private_key(&document)
}

/// Parse a private key from its encrypted PKCS#8 PEM form
///
/// Unencrypted documents are accepted as well, the password is ignored for them
#[inline]
pub fn encrypted_private_key(pem: &str, password: &str) -> Result<PrivateKey, Error> {
    let (tag_line, document) = SecretDocument::from_pem(pem)?;
    if tag_line != ENCRYPTED_PRIVATE_KEY_LABEL {
        return decode_private_key(&document);
    }

    let encrypted = EncryptedPrivateKeyInfo::try_from(document.as_bytes())?;
    let document = encrypted.decrypt(password)?;

    decode_private_key(&document)
}

/// Parse a key usable for verification
///
/// Accepts SPKI public keys directly and derives the public key from unencrypted private keys
#[inline]
pub fn verifying_key(pem: &str, password: Option<&str>) -> Result<PublicKey, Error> {
    let label = pkcs8::der::pem::decode_label(pem.trim_start().as_bytes())
        .map_err(pkcs8::der::Error::from)?;

    if label == PUBLIC_KEY_LABEL {
        return public_key(pem);
    }

    let private_key = match password {
        Some(password) => encrypted_private_key(pem, password)?,
        None => private_key(pem)?,
    };

    Ok(private_key.public_key())
}

#[cfg(test)]
mod test {
    use super::{encrypted_private_key, private_key, public_key, verifying_key, Error};
    use crate::crypto::KeyType;

    const ALICE: &str = include_str!("../../tests/keys/alice.pem");
    const ALICE_ENCRYPTED: &str = include_str!("../../tests/keys/alice.enc.pem");
    const ALICE_PUBLIC: &str = include_str!("../../tests/keys/alice.pub.pem");
    const BOB: &str = include_str!("../../tests/keys/bob.pem");
    const BOB_PUBLIC: &str = include_str!("../../tests/keys/bob.pub.pem");

    #[test]
    fn rsa_keys() {
        let private = private_key(ALICE).unwrap();
        let public = public_key(ALICE_PUBLIC).unwrap();

        assert_eq!(private.key_type(), KeyType::Rsa);
        assert_eq!(private.public_key(), public);
    }

    #[test]
    fn ed25519_keys() {
        let private = private_key(BOB).unwrap();
        let public = public_key(BOB_PUBLIC).unwrap();

        assert_eq!(private.key_type(), KeyType::Ed25519);
        assert_eq!(private.public_key(), public);
    }

    #[test]
    fn encrypted_keys() {
        assert!(matches!(private_key(ALICE_ENCRYPTED), Err(Error::Encrypted)));
        assert!(encrypted_private_key(ALICE_ENCRYPTED, "wrong").is_err());

        let private = encrypted_private_key(ALICE_ENCRYPTED, "password").unwrap();
        assert_eq!(private.public_key(), public_key(ALICE_PUBLIC).unwrap());
    }

    #[test]
    fn verifying_keys() {
        let expected = public_key(ALICE_PUBLIC).unwrap();

        assert_eq!(verifying_key(ALICE_PUBLIC, None).unwrap(), expected);
        assert_eq!(verifying_key(ALICE, None).unwrap(), expected);
        assert_eq!(
            verifying_key(ALICE_ENCRYPTED, Some("password")).unwrap(),
            expected
        );
    }

    #[test]
    fn garbage() {
        assert!(public_key("not a key").is_err());
        assert!(private_key(ALICE_PUBLIC).is_err());
    }
}
