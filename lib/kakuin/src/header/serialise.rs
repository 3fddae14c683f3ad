use super::SignatureParameters;
use std::fmt::Write;

/// Serialise the parameters into a `Signature` header value
///
/// Parameters are always emitted in the order `keyId`, `algorithm`, `headers`, `signature`, `created`, `expires`
#[inline]
#[must_use]
pub fn serialise(params: &SignatureParameters) -> String {
    let mut buffer = String::new();

    let _ = write!(buffer, "keyId=\"{}\"", params.key_id);

    if let Some(algorithm) = params.algorithm {
        let _ = write!(buffer, ",algorithm=\"{algorithm}\"");
    }

    buffer.push_str(",headers=\"");
    for item in itertools::intersperse(params.components(), " ") {
        buffer.push_str(item);
    }
    buffer.push('"');

    let _ = write!(
        buffer,
        ",signature=\"{}\"",
        base64_simd::STANDARD.encode_to_string(&params.signature)
    );

    if let Some(created) = params.created {
        let _ = write!(buffer, ",created={created}");
    }

    if let Some(expires) = params.expires {
        let _ = write!(buffer, ",expires={expires}");
    }

    buffer
}
