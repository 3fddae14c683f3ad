//!
//! The `Signature` header
//!

use crate::{algorithm::SignatureAlgorithm, canonical::Timestamps, REQUEST_TARGET};

mod parse;
mod serialise;

pub use self::{
    parse::{parse, ParseError},
    serialise::serialise,
};

/// Components assumed to be signed when the `headers` parameter is absent
pub const DEFAULT_COMPONENTS: &[&str] = &[REQUEST_TARGET, "date"];

/// Decoded parameters of a `Signature` header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureParameters {
    /// Identifier of the key the signature was created with
    pub key_id: String,

    /// Signature algorithm, if the header names one
    pub algorithm: Option<SignatureAlgorithm>,

    /// Signed components, in signing order
    pub headers: Vec<String>,

    /// Raw signature bytes
    pub signature: Vec<u8>,

    /// Unix timestamp of the signature creation
    pub created: Option<u64>,

    /// Unix timestamp of the signature expiry
    pub expires: Option<u64>,
}

impl SignatureParameters {
    /// Iterator over the signed component names
    pub fn components(&self) -> impl Iterator<Item = &str> + Clone {
        self.headers.iter().map(String::as_str)
    }

    /// Check whether a component was signed (case-insensitively)
    #[must_use]
    pub fn covers(&self, component: &str) -> bool {
        self.components()
            .any(|signed| signed.eq_ignore_ascii_case(component))
    }

    /// Timestamps carried by the header
    #[must_use]
    pub fn timestamps(&self) -> Timestamps {
        Timestamps {
            created: self.created,
            expires: self.expires,
        }
    }
}
