use crate::{canonical, crypto, BoxError};
use miette::Diagnostic;
use std::time::SystemTimeError;
use thiserror::Error;

/// Signing error
///
/// These are configuration or programming errors of the caller and are never retried
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Signature string couldn't be constructed
    #[error(transparent)]
    Canonicalisation(#[from] canonical::Error),

    /// Produced header value is invalid (the key ID contains characters illegal in headers)
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Key resolver failed
    #[error("Failed to resolve key")]
    KeyResolution(#[source] BoxError),

    /// Signing failed
    #[error(transparent)]
    Signing(#[from] crypto::SignError),

    /// System clock is set before the unix epoch
    #[error(transparent)]
    SystemTime(#[from] SystemTimeError),

    /// Key resolver doesn't know the key ID
    #[error("Unknown key ID `{0}`")]
    UnknownKeyId(String),
}

impl Error {
    /// Whether the error was caused by a header missing from the message
    #[must_use]
    pub fn is_missing_header(&self) -> bool {
        matches!(
            self,
            Self::Canonicalisation(canonical::Error::MissingHeader(..))
        )
    }
}
