//!
//! `Digest` header for message bodies
//!
//! The header has the form `<algorithm>=<base64 digest>`, e.g. `SHA-256=X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=`
//!

use crate::algorithm::DigestAlgorithm;
use http::{HeaderName, HeaderValue};
use miette::Diagnostic;
use std::str::FromStr;
use thiserror::Error;

/// Name of the header carrying the body digest
pub static DIGEST_HEADER: HeaderName = HeaderName::from_static("digest");

/// Digest header error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Digest wasn't valid Base64
    #[error(transparent)]
    Base64(#[from] base64_simd::Error),

    /// Header value doesn't have the `<algorithm>=<digest>` form
    #[error("Malformed digest header")]
    Malformed,

    /// Header value contained non-visible ASCII characters
    #[error(transparent)]
    ToStr(#[from] http::header::ToStrError),

    /// Digest algorithm isn't supported
    #[error("Unsupported digest algorithm `{0}`")]
    UnsupportedAlgorithm(String),
}

/// Compute the `Digest` header value for a body
#[must_use]
pub fn header_value(algorithm: DigestAlgorithm, body: &[u8]) -> HeaderValue {
    let hash = algorithm.digest(body);
    let encoded_digest = base64_simd::STANDARD.encode_to_string(hash);

    HeaderValue::try_from(format!("{algorithm}={encoded_digest}"))
        .expect("[Bug] Digest header value contains invalid characters")
}

fn split(value: &HeaderValue) -> Result<(DigestAlgorithm, &str), Error> {
    let (algorithm_name, encoded_digest) = value.to_str()?.split_once('=').ok_or(Error::Malformed)?;
    let algorithm = DigestAlgorithm::from_str(algorithm_name.trim())
        .map_err(|_| Error::UnsupportedAlgorithm(algorithm_name.to_string()))?;

    Ok((algorithm, encoded_digest.trim()))
}

/// Algorithm named by a `Digest` header value
pub fn algorithm(value: &HeaderValue) -> Result<DigestAlgorithm, Error> {
    split(value).map(|(algorithm, _)| algorithm)
}

/// Check the `Digest` header value against a body
///
/// The digest is recomputed with the algorithm named in the header value
pub fn verify(value: &HeaderValue, body: &[u8]) -> Result<bool, Error> {
    let (algorithm, encoded_digest) = split(value)?;
    let expected = base64_simd::STANDARD.decode_to_vec(encoded_digest)?;

    Ok(algorithm.digest(body).as_ref() == expected.as_slice())
}

#[cfg(test)]
mod test {
    use super::{algorithm, header_value, verify, Error};
    use crate::algorithm::DigestAlgorithm;
    use http::HeaderValue;

    const BODY: &[u8] = br#"{"hello": "world"}"#;

    #[test]
    fn known_digest() {
        assert_eq!(
            header_value(DigestAlgorithm::Sha256, BODY),
            "SHA-256=X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE="
        );
    }

    #[test]
    fn verify_digest() {
        for algorithm in [DigestAlgorithm::Sha256, DigestAlgorithm::Sha512] {
            let value = header_value(algorithm, BODY);
            assert!(verify(&value, BODY).unwrap());
            assert!(!verify(&value, b"tampered").unwrap());
        }

        let lowercase = HeaderValue::from_static("sha-256=X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=");
        assert!(verify(&lowercase, BODY).unwrap());
    }

    #[test]
    fn named_algorithm() {
        let value = header_value(DigestAlgorithm::Sha512, BODY);
        assert_eq!(algorithm(&value).unwrap(), DigestAlgorithm::Sha512);

        let value = HeaderValue::from_static("sha-256=X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=");
        assert_eq!(algorithm(&value).unwrap(), DigestAlgorithm::Sha256);
    }

    #[test]
    fn digest_of_other_body() {
        let value = header_value(DigestAlgorithm::Sha256, BODY);
        assert!(!verify(&value, br#"{"hello": "world!"}"#).unwrap());
        assert!(!verify(&value, b"").unwrap());
    }

    #[test]
    fn malformed_digest() {
        assert!(matches!(
            verify(&HeaderValue::from_static("nonsense"), BODY),
            Err(Error::Malformed)
        ));
        assert!(matches!(
            verify(&HeaderValue::from_static("MD5=abc="), BODY),
            Err(Error::UnsupportedAlgorithm(..))
        ));
    }
}
