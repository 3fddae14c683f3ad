//!
//! HTTP message signatures
//!
//! Implements the `Signature` header scheme of the cavage HTTP signatures draft.
//! Only asymmetric signing schemes are supported (aka. no HMAC and such)
//!

use http::HeaderName;

pub mod algorithm;
pub mod canonical;
pub mod config;
pub mod crypto;
pub mod digest;
pub mod header;
pub mod key;
pub mod signer;
pub mod verifier;

#[cfg(feature = "easy")]
pub mod easy;

mod error;

pub use self::{
    algorithm::{DigestAlgorithm, SignatureAlgorithm, SigningAlgorithm},
    error::Error,
    header::SignatureParameters,
    key::{KeyResolver, KeyStore},
    signer::MessageSigner,
    verifier::{Accepted, MessageVerifier, Rejection},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type Result<T, E = Error> = std::result::Result<T, E>;

/// Name of the header carrying the signature
pub static SIGNATURE_HEADER: HeaderName = HeaderName::from_static("signature");

/// Pseudo-header covering the lowercased method and the request path
pub const REQUEST_TARGET: &str = "(request-target)";

/// Pseudo-header covering the `created` signature parameter
pub const CREATED: &str = "(created)";

/// Pseudo-header covering the `expires` signature parameter
pub const EXPIRES: &str = "(expires)";
