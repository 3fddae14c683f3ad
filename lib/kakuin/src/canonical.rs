//!
//! Construction of the signature string
//!
//! Both the signer and the verifier build the exact same string from the same message components.
//!

use crate::{CREATED, EXPIRES, REQUEST_TARGET};
use http::{HeaderMap, Method};
use miette::Diagnostic;
use std::fmt::Write;
use thiserror::Error;

/// Signature string error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Header had an invalid value (non-visible ASCII)
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::ToStrError),

    /// Header is missing from the message
    #[error("Missing header `{0}`")]
    MissingHeader(String),

    /// `(created)` or `(expires)` was listed without the matching timestamp
    #[error("Missing timestamp for `{0}`")]
    MissingTimestamp(&'static str),

    /// No components were listed
    #[error("Empty component list")]
    NoComponents,
}

/// Signature timestamps rendered by the `(created)` and `(expires)` pseudo-headers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamps {
    /// Unix timestamp of the signature creation
    pub created: Option<u64>,

    /// Unix timestamp of the signature expiry
    pub expires: Option<u64>,
}

/// Construct the signature string from the listed components
///
/// The order of `components` is the only ordering that matters.
/// The order of the header map is only relevant for the order in which multiple values of one header are joined.
#[inline]
pub fn construct<'a, I>(
    components: I,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    timestamps: Timestamps,
) -> Result<String, Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut signature_string = String::new();
    let mut is_empty = true;

    for name in components {
        is_empty = false;

        match name {
            REQUEST_TARGET => {
                let method = method.as_str().to_lowercase();
                let _ = writeln!(signature_string, "{REQUEST_TARGET}: {method} {path}");
            }
            CREATED => {
                let created = timestamps.created.ok_or(Error::MissingTimestamp(CREATED))?;
                let _ = writeln!(signature_string, "{CREATED}: {created}");
            }
            EXPIRES => {
                let expires = timestamps.expires.ok_or(Error::MissingTimestamp(EXPIRES))?;
                let _ = writeln!(signature_string, "{EXPIRES}: {expires}");
            }
            header => {
                let mut values = headers.get_all(header).iter().peekable();
                if values.peek().is_none() {
                    return Err(Error::MissingHeader(header.to_string()));
                }

                let _ = write!(signature_string, "{}: ", header.to_lowercase());
                for (idx, value) in values.enumerate() {
                    if idx > 0 {
                        signature_string.push_str(", ");
                    }
                    signature_string.push_str(value.to_str()?.trim());
                }
                signature_string.push('\n');
            }
        }
    }

    if is_empty {
        return Err(Error::NoComponents);
    }

    // Remove the last new-line
    signature_string.pop();

    Ok(signature_string)
}
