use super::{SignatureParameters, DEFAULT_COMPONENTS};
use crate::algorithm::SignatureAlgorithm;
use logos::{Lexer, Logos, Span};
use miette::{Diagnostic, SourceSpan};
use std::{num::ParseIntError, str::FromStr};
use thiserror::Error;

/// `Signature` header parsing error
#[derive(Debug, Diagnostic, Error)]
pub enum ParseError {
    /// Header value is empty
    #[error("Empty signature header")]
    Empty,

    /// Parameter appeared more than once
    #[error("Duplicate `{name}` parameter")]
    DuplicateParameter {
        /// Name of the parameter
        name: &'static str,

        /// Location of the second occurrence
        #[label("defined again here")]
        span: SourceSpan,
    },

    /// Parameter was present but empty
    #[error("Empty `{0}` parameter")]
    EmptyParameter(&'static str),

    /// Signature wasn't valid Base64
    #[error(transparent)]
    InvalidSignature(#[from] base64_simd::Error),

    /// `created` or `expires` wasn't an unsigned integer
    #[error(transparent)]
    InvalidTimestamp(#[from] ParseIntError),

    /// Required parameter is missing
    #[error("Missing `{0}` parameter")]
    MissingParameter(&'static str),

    /// Input ended in the middle of a parameter
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    /// Token didn't fit the `key="value"` grammar
    #[error("Unexpected token")]
    #[diagnostic(help("parameters are written as key=\"value\" and separated by commas"))]
    UnexpectedToken {
        /// Location of the offending token
        #[label("unexpected")]
        span: SourceSpan,
    },

    /// Algorithm identifier isn't supported
    #[error("Unsupported algorithm `{0}`")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Logos)]
#[logos(skip r"[ \t]+")]
enum TokenTy {
    #[regex(r"[\w\-.]+")]
    Ident,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#)]
    Value,

    #[token(",")]
    Comma,
}

#[derive(Debug)]
struct Token {
    pub ty: TokenTy,
    pub span: Span,
}

impl Token {
    pub fn parse(input: &str) -> impl Iterator<Item = Result<Token, Span>> + '_ {
        Lexer::<'_, TokenTy>::new(input)
            .spanned()
            .map(|(ty, span)| match ty {
                Ok(ty) => Ok(Token { ty, span }),
                Err(()) => Err(span),
            })
    }
}

macro_rules! ensure {
    ($self:expr, $value:expr, $pattern:pat) => {{
        let Some(value) = $value else {
            $self.is_broken = true;
            return Some(Err(ParseError::UnexpectedEnd));
        };

        let value = match value {
            Ok(value) => value,
            Err(span) => {
                $self.is_broken = true;
                return Some(Err(ParseError::UnexpectedToken { span: span.into() }));
            }
        };

        if !matches!(value.ty, $pattern) {
            $self.is_broken = true;
            return Some(Err(ParseError::UnexpectedToken {
                span: value.span.into(),
            }));
        }

        value
    }};
}

struct ParseIter<'a, I> {
    /// Stream of tokens wrapped into a result
    inner: I,

    /// Reference to the original input that was fed to the lexer
    input: &'a str,

    /// Marker whether we encountered any error or illegal token
    ///
    /// If we did, the iterator will stop yielding any results
    is_broken: bool,
}

impl<'a, I> Iterator for ParseIter<'a, I>
where
    I: Iterator<Item = Result<Token, Span>>,
{
    type Item = Result<(&'a str, &'a str, Span), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_broken {
            return None;
        }

        let key = ensure!(self, Some(self.inner.next()?), TokenTy::Ident);
        ensure!(self, self.inner.next(), TokenTy::Equals);
        let value = ensure!(self, self.inner.next(), TokenTy::Value | TokenTy::Ident);

        if let Some(next) = self.inner.next() {
            ensure!(self, Some(next), TokenTy::Comma);
        }

        let span = key.span.start..value.span.end;
        let key = &self.input[key.span];
        let value = &self.input[value.span];
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .unwrap_or(value);

        Some(Ok((key, value, span)))
    }
}

fn set<'a>(
    slot: &mut Option<&'a str>,
    name: &'static str,
    value: &'a str,
    span: Span,
) -> Result<(), ParseError> {
    if slot.replace(value).is_some() {
        return Err(ParseError::DuplicateParameter {
            name,
            span: span.into(),
        });
    }

    Ok(())
}

/// Parse a `Signature` header value into its parameters
///
/// Parameter order doesn't matter. Unknown parameters are ignored.
pub fn parse(input: &str) -> Result<SignatureParameters, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let kv_iter = ParseIter {
        inner: Token::parse(input),
        input,
        is_broken: false,
    };

    let mut key_id = None;
    let mut algorithm = None;
    let mut headers = None;
    let mut signature = None;
    let mut created = None;
    let mut expires = None;

    for kv in kv_iter {
        let (key, value, span) = kv?;

        match key {
            "keyId" => set(&mut key_id, "keyId", value, span)?,
            "algorithm" => set(&mut algorithm, "algorithm", value, span)?,
            "headers" => set(&mut headers, "headers", value, span)?,
            "signature" => set(&mut signature, "signature", value, span)?,
            "created" => set(&mut created, "created", value, span)?,
            "expires" => set(&mut expires, "expires", value, span)?,
            _ => {}
        }
    }

    let key_id = key_id.ok_or(ParseError::MissingParameter("keyId"))?;
    if key_id.is_empty() {
        return Err(ParseError::EmptyParameter("keyId"));
    }

    let signature = signature.ok_or(ParseError::MissingParameter("signature"))?;
    if signature.is_empty() {
        return Err(ParseError::EmptyParameter("signature"));
    }
    let signature = base64_simd::STANDARD.decode_to_vec(signature)?;

    let algorithm = algorithm
        .map(|algorithm| {
            SignatureAlgorithm::from_str(algorithm)
                .map_err(|_| ParseError::UnsupportedAlgorithm(algorithm.to_string()))
        })
        .transpose()?;

    let headers: Vec<String> = match headers {
        Some(headers) => headers
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect(),
        None => DEFAULT_COMPONENTS.iter().map(|name| (*name).to_string()).collect(),
    };
    if headers.is_empty() {
        return Err(ParseError::EmptyParameter("headers"));
    }

    Ok(SignatureParameters {
        key_id: key_id.to_string(),
        algorithm,
        headers,
        signature,
        created: created.map(str::parse).transpose()?,
        expires: expires.map(str::parse).transpose()?,
    })
}

#[cfg(test)]
mod test {
    use super::{parse, ParseError};
    use crate::{
        algorithm::SignatureAlgorithm,
        header::{serialise, SignatureParameters},
    };
    use proptest::{collection::vec, option, prop_assert_eq, prop_oneof, proptest, strategy::Just};

    const HEADER: &str = r#"keyId="Test",algorithm="rsa-sha256",headers="(request-target) host date",signature="qdx+H7PHHDZgy4y/Ahn9Tny9V3GP6YgBPyUXMmoxWtLbHpUnXS2mg2+SbrQDMCJypxBLSPQR2aAjn7ndmw2iicw3HMbe8VfEdKFYRqzic+efkb3nndiv/x1xSHDJWeSWkx3ButlYSuBskLu6kd9Fswtemr3lgdDEmn04swr2Os0=""#;

    #[test]
    fn parse_header() {
        let header = parse(HEADER).unwrap();

        assert_eq!(header.created, None);
        assert_eq!(header.expires, None);
        assert_eq!(header.key_id, "Test");
        assert_eq!(header.algorithm, Some(SignatureAlgorithm::RsaSha256));
        assert_eq!(header.signature.len(), 128);
        assert_eq!(header.headers, ["(request-target)", "host", "date"]);
    }

    #[test]
    fn parse_timestamps() {
        let header = parse(r#"keyId="Test",algorithm="rsa-sha256",created=1402170695, expires=1402170699,headers="(request-target) (created) (expires) host date content-type digest content-length",signature="vSdr""#).unwrap();

        assert_eq!(header.created, Some(1_402_170_695));
        assert_eq!(header.expires, Some(1_402_170_699));
        assert_eq!(header.headers.len(), 8);
    }

    #[test]
    fn order_and_optional_parameters() {
        let header = parse(r#"signature="AQ==", keyId="alice-key-id""#).unwrap();

        assert_eq!(header.key_id, "alice-key-id");
        assert_eq!(header.algorithm, None);
        assert_eq!(header.headers, ["(request-target)", "date"]);
        assert_eq!(header.signature, [1]);
    }

    #[test]
    fn component_names_are_lowercased() {
        let header =
            parse(r#"keyId="a",headers="(Request-Target) Content-Type DATE",signature="AQ==""#)
                .unwrap();

        assert_eq!(header.headers, ["(request-target)", "content-type", "date"]);
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let header = parse(r#"keyId="a",nonce="xyz",signature="AQ==""#).unwrap();
        assert_eq!(header.key_id, "a");
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(parse(""), Err(ParseError::Empty)));
        assert!(matches!(parse("   "), Err(ParseError::Empty)));
        assert!(matches!(
            parse(r#"keyId="a""#),
            Err(ParseError::MissingParameter("signature"))
        ));
        assert!(matches!(
            parse(r#"signature="AQ==""#),
            Err(ParseError::MissingParameter("keyId"))
        ));
        assert!(matches!(
            parse(r#"keyId="a",signature="""#),
            Err(ParseError::EmptyParameter("signature"))
        ));
        assert!(matches!(
            parse(r#"keyId="a",headers="",signature="AQ==""#),
            Err(ParseError::EmptyParameter("headers"))
        ));
        assert!(matches!(
            parse(r#"keyId="a",signature="not base64!""#),
            Err(ParseError::InvalidSignature(..))
        ));
        assert!(matches!(
            parse(r#"keyId="a" signature="AQ==""#),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse(r#"keyId,signature="AQ==""#),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse(r#"keyId="a,signature="AQ==""#),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse(r#"keyId="a",signature="AQ==",keyId="b""#),
            Err(ParseError::DuplicateParameter { name: "keyId", .. })
        ));
        assert!(matches!(
            parse(r#"keyId="a",algorithm="hmac-sha256",signature="AQ==""#),
            Err(ParseError::UnsupportedAlgorithm(..))
        ));
        assert!(matches!(
            parse(r#"keyId="a",created=yesterday,signature="AQ==""#),
            Err(ParseError::InvalidTimestamp(..))
        ));
        assert!(matches!(parse(r#"keyId="#), Err(ParseError::UnexpectedEnd)));
    }

    proptest! {
        #[test]
        fn roundtrip(
            key_id in "[a-zA-Z0-9\\-_.:/]{1,24}",
            algorithm in option::of(prop_oneof![
                Just(SignatureAlgorithm::RsaSha256),
                Just(SignatureAlgorithm::RsaSha512),
                Just(SignatureAlgorithm::Ed25519),
            ]),
            headers in vec("\\(request-target\\)|[a-z\\-]{1,16}", 1..6),
            signature in vec(proptest::num::u8::ANY, 1..96),
            created in option::of(proptest::num::u64::ANY),
            expires in option::of(proptest::num::u64::ANY),
        ) {
            let params = SignatureParameters {
                key_id,
                algorithm,
                headers,
                signature,
                created,
                expires,
            };

            prop_assert_eq!(parse(&serialise(&params)).unwrap(), params);
        }
    }
}
