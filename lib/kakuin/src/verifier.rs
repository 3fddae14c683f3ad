//!
//! Verification of HTTP messages
//!
//! Verification runs through a fixed sequence of steps.
//! The first failing step decides the [`Rejection`], nothing is retried.
//!
//! 1. Decode the `Signature` header
//! 2. Resolve the public key by its key ID
//! 3. Check the policy (required components, expected algorithm, expiry)
//! 4. Reconstruct the signature string from the live message
//! 5. Verify the signature
//!

use crate::{
    algorithm::{DigestAlgorithm, SignatureAlgorithm, SigningAlgorithm},
    canonical,
    crypto::{self, PublicKey, VerifyError},
    header::{self, ParseError, SignatureParameters},
    key::KeyResolver,
    BoxError, CREATED, EXPIRES, REQUEST_TARGET, SIGNATURE_HEADER,
};
use http::{HeaderMap, Method};
use miette::Diagnostic;
use std::{
    borrow::Borrow,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tracing::{debug, instrument, trace};
use typed_builder::TypedBuilder;

/// Reason a message was rejected
#[derive(Debug, Diagnostic, Error)]
pub enum Rejection {
    /// Signature algorithm isn't the expected one, or the key can't verify it
    #[error("Signature algorithm `{0}` isn't accepted")]
    AlgorithmMismatch(SignatureAlgorithm),

    /// Body doesn't match the `Digest` header
    #[error("Body doesn't match the digest")]
    DigestMismatch,

    /// Signature expired
    #[error("Signature is expired")]
    Expired,

    /// A signed header has a value that isn't visible ASCII
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::ToStrError),

    /// Key resolver failed
    #[error("Failed to resolve key")]
    KeyResolution(#[source] BoxError),

    /// Resolved key isn't structurally valid
    #[error("Key for key ID `{0}` is malformed")]
    MalformedKey(String),

    /// A header listed as signed is missing from the message
    #[error("Signed header `{0}` is missing from the message")]
    MissingHeader(String),

    /// `Signature` header is missing or malformed
    #[error("Missing or malformed signature header")]
    MissingOrMalformedSignature(#[source] Option<ParseError>),

    /// A component required by the policy wasn't signed
    #[error("Required component `{0}` wasn't signed")]
    RequiredHeaderNotSigned(String),

    /// Signature doesn't match the message
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// Key ID is unknown to the key resolver
    #[error("Unknown key ID `{0}`")]
    UnknownKeyId(String),
}

impl From<canonical::Error> for Rejection {
    fn from(value: canonical::Error) -> Self {
        match value {
            canonical::Error::InvalidHeaderValue(err) => Self::InvalidHeaderValue(err),
            canonical::Error::MissingHeader(name) => Self::MissingHeader(name),
            canonical::Error::MissingTimestamp(..) | canonical::Error::NoComponents => {
                Self::MissingOrMalformedSignature(None)
            }
        }
    }
}

/// Successfully verified signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accepted {
    /// Key ID the signature was verified with
    pub key_id: String,

    /// Algorithm the signature was verified with
    pub algorithm: SignatureAlgorithm,

    /// Components covered by the signature
    pub components: Vec<String>,
}

/// HTTP message verifier
///
/// Verification is a pure function of the message, the verifier configuration and the key resolver
#[derive(Clone, TypedBuilder)]
pub struct MessageVerifier<R> {
    /// Resolver handing out public keys
    key_resolver: R,

    /// Components that must have been signed
    #[builder(default = vec![REQUEST_TARGET.to_string()])]
    required_components: Vec<String>,

    /// Only accept signatures of this algorithm
    ///
    /// Signatures without an `algorithm` parameter are treated as this algorithm.
    /// If set to `None`, any supported algorithm is accepted and signatures without the parameter are treated as `rsa-sha256`.
    #[builder(default = Some(SignatureAlgorithm::default()))]
    expected_algorithm: Option<SignatureAlgorithm>,

    /// Body digest algorithm paired with the signature algorithm
    ///
    /// `Digest` headers naming any other algorithm are rejected by the transport adapters
    #[builder(default)]
    digest_algorithm: DigestAlgorithm,

    /// Reject signatures whose `expires` parameter lies in the past
    #[builder(default = true)]
    check_expiration: bool,
}

impl<R> MessageVerifier<R> {
    /// Body digest algorithm this verifier accepts
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    fn check_policy(&self, params: &SignatureParameters) -> Result<SignatureAlgorithm, Rejection> {
        if let Some(missing) = self
            .required_components
            .iter()
            .find(|required| !params.covers(required))
        {
            return Err(Rejection::RequiredHeaderNotSigned(missing.clone()));
        }

        let algorithm = params
            .algorithm
            .or(self.expected_algorithm)
            .unwrap_or_default();

        if let Some(expected) = self.expected_algorithm {
            if algorithm != expected {
                return Err(Rejection::AlgorithmMismatch(algorithm));
            }
        }

        if (params.covers(CREATED) && params.created.is_none())
            || (params.covers(EXPIRES) && params.expires.is_none())
        {
            return Err(Rejection::MissingOrMalformedSignature(None));
        }

        if self.check_expiration {
            if let Some(expires) = params.expires {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |now| now.as_secs());

                if expires < now {
                    return Err(Rejection::Expired);
                }
            }
        }

        Ok(algorithm)
    }
}

impl<R> MessageVerifier<R>
where
    R: KeyResolver,
    R::Key: Borrow<PublicKey>,
{
    /// Verify the `Signature` header of an HTTP message
    #[instrument(skip_all)]
    pub fn verify(
        &self,
        headers: &HeaderMap,
        method: &Method,
        path: &str,
    ) -> Result<Accepted, Rejection> {
        let result = self.run(headers, method, path);

        match result {
            Ok(ref accepted) => debug!(key_id = %accepted.key_id, "accepted signature"),
            Err(ref rejection) => debug!(%rejection, "rejected signature"),
        }

        result
    }

    fn run(&self, headers: &HeaderMap, method: &Method, path: &str) -> Result<Accepted, Rejection> {
        let mut values = headers.get_all(&SIGNATURE_HEADER).iter();
        let (Some(value), None) = (values.next(), values.next()) else {
            return Err(Rejection::MissingOrMalformedSignature(None));
        };

        let value = value
            .to_str()
            .map_err(|_| Rejection::MissingOrMalformedSignature(None))?;
        let params =
            header::parse(value).map_err(|err| Rejection::MissingOrMalformedSignature(Some(err)))?;

        let public_key = self
            .key_resolver
            .resolve(&params.key_id)
            .map_err(Rejection::KeyResolution)?
            .ok_or_else(|| Rejection::UnknownKeyId(params.key_id.clone()))?;

        let algorithm = self.check_policy(&params)?;

        let signature_string =
            canonical::construct(params.components(), method, path, headers, params.timestamps())?;
        trace!(len = signature_string.len(), "reconstructed signature string");

        let is_valid = crypto::verify(
            SigningAlgorithm::new(algorithm, self.digest_algorithm),
            public_key.borrow(),
            signature_string.as_bytes(),
            &params.signature,
        )
        .map_err(|err| match err {
            VerifyError::KeyMismatch { .. } => Rejection::AlgorithmMismatch(algorithm),
            VerifyError::MalformedKey(..) => Rejection::MalformedKey(params.key_id.clone()),
        })?;

        if !is_valid {
            return Err(Rejection::SignatureMismatch);
        }

        Ok(Accepted {
            key_id: params.key_id,
            algorithm,
            components: params.headers,
        })
    }
}
