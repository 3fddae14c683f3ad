//!
//! Signing of HTTP messages
//!

use crate::{
    algorithm::SigningAlgorithm,
    canonical::{self, Timestamps},
    crypto::{self, PrivateKey},
    header::{self, SignatureParameters},
    key::KeyResolver,
    Error, Result, CREATED, EXPIRES, REQUEST_TARGET, SIGNATURE_HEADER,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::{
    borrow::Borrow,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{instrument, trace};
use typed_builder::TypedBuilder;

/// HTTP message signer
///
/// Immutable after construction. Sharing it between threads is fine as long as the key resolver allows it.
#[derive(Clone, TypedBuilder)]
pub struct MessageSigner<R> {
    /// Key ID embedded into the signature and used to resolve the private key
    #[builder(setter(into))]
    key_id: String,

    /// Resolver handing out the private key
    key_resolver: R,

    /// Signature and digest algorithm
    #[builder(default, setter(into))]
    algorithm: SigningAlgorithm,

    /// Components to sign, in signing order
    ///
    /// Defaults to `(request-target)` followed by every header present in the message
    #[builder(default, setter(into))]
    components: Option<Vec<String>>,

    /// Include the creation timestamp into the signature
    #[builder(default)]
    include_created: bool,

    /// Duration in which the signature expires
    #[builder(default, setter(strip_option))]
    expires_in: Option<Duration>,
}

impl<R> MessageSigner<R> {
    /// Key ID of this signer
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Algorithm pair of this signer
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    fn select_components(&self, headers: &HeaderMap, timestamps: Timestamps) -> Vec<String> {
        if let Some(ref components) = self.components {
            return components
                .iter()
                .map(|component| component.to_lowercase())
                .collect();
        }

        let mut components = vec![REQUEST_TARGET.to_string()];
        components.extend(
            headers
                .keys()
                .filter(|name| **name != SIGNATURE_HEADER)
                .map(|name| name.as_str().to_string()),
        );

        if timestamps.created.is_some() {
            components.push(CREATED.to_string());
        }
        if timestamps.expires.is_some() {
            components.push(EXPIRES.to_string());
        }

        components
    }
}

impl<R> MessageSigner<R>
where
    R: KeyResolver,
    R::Key: Borrow<PrivateKey>,
{
    /// Sign an HTTP message
    ///
    /// Returns the `Signature` header. The header map itself is left untouched.
    #[instrument(skip_all, fields(key_id = %self.key_id, algorithm = %self.algorithm.signature))]
    pub fn sign(
        &self,
        headers: &HeaderMap,
        method: &Method,
        path: &str,
    ) -> Result<(HeaderName, HeaderValue)> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
        let timestamps = Timestamps {
            created: self.include_created.then_some(now.as_secs()),
            expires: self
                .expires_in
                .map(|expires_in| (now + expires_in).as_secs()),
        };

        let components = self.select_components(headers, timestamps);
        let signature_string = canonical::construct(
            components.iter().map(String::as_str),
            method,
            path,
            headers,
            timestamps,
        )?;
        trace!(len = signature_string.len(), "constructed signature string");

        let key = self
            .key_resolver
            .resolve(&self.key_id)
            .map_err(Error::KeyResolution)?
            .ok_or_else(|| Error::UnknownKeyId(self.key_id.clone()))?;

        let signature = crypto::sign(self.algorithm, key.borrow(), signature_string.as_bytes())?;

        let params = SignatureParameters {
            key_id: self.key_id.clone(),
            algorithm: Some(self.algorithm.signature),
            headers: components,
            signature,
            created: timestamps.created,
            expires: timestamps.expires,
        };

        Ok((
            SIGNATURE_HEADER.clone(),
            HeaderValue::from_str(&header::serialise(&params))?,
        ))
    }

    /// Sign an HTTP message and insert the `Signature` header into its header map
    ///
    /// An existing `Signature` header is replaced. No other header is touched.
    pub fn sign_in_place(&self, headers: &mut HeaderMap, method: &Method, path: &str) -> Result<()> {
        let (name, value) = self.sign(headers, method, path)?;
        headers.insert(name, value);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::MessageSigner;
    use crate::{
        crypto::{parse, PrivateKey},
        header, Error, KeyStore, SignatureAlgorithm, SIGNATURE_HEADER,
    };
    use http::{HeaderMap, HeaderValue, Method};
    use std::{sync::Arc, time::Duration};

    const ALICE: &str = include_str!("../tests/keys/alice.pem");
    const BOB: &str = include_str!("../tests/keys/bob.pem");

    fn store() -> KeyStore<Arc<PrivateKey>> {
        KeyStore::new()
            .with("alice-key-id", Arc::new(parse::private_key(ALICE).unwrap()))
            .with("bob-key-id", Arc::new(parse::private_key(BOB).unwrap()))
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/xml"));
        headers.insert("Content-Type", HeaderValue::from_static("application/xml"));
        headers
    }

    #[test]
    fn default_components() {
        let signer = MessageSigner::builder()
            .key_id("alice-key-id")
            .key_resolver(store())
            .build();

        let (name, value) = signer
            .sign(&headers(), &Method::POST, "/httpsig/bookstore/books")
            .unwrap();
        let params = header::parse(value.to_str().unwrap()).unwrap();

        assert_eq!(name, SIGNATURE_HEADER);
        assert_eq!(params.key_id, "alice-key-id");
        assert_eq!(params.algorithm, Some(SignatureAlgorithm::RsaSha256));
        assert_eq!(params.headers, ["(request-target)", "accept", "content-type"]);
        assert_eq!(params.signature.len(), 256);
    }

    #[test]
    fn explicit_components_are_lowercased() {
        let signer = MessageSigner::builder()
            .key_id("alice-key-id")
            .key_resolver(store())
            .components(vec!["Accept".to_string(), "(request-target)".to_string()])
            .build();

        let (_name, value) = signer.sign(&headers(), &Method::GET, "/").unwrap();
        let params = header::parse(value.to_str().unwrap()).unwrap();

        assert_eq!(params.headers, ["accept", "(request-target)"]);
    }

    #[test]
    fn replaces_only_the_signature() {
        let signer = MessageSigner::builder()
            .key_id("alice-key-id")
            .key_resolver(store())
            .build();

        let mut headers = headers();
        headers.insert(&SIGNATURE_HEADER, HeaderValue::from_static("stale"));
        signer
            .sign_in_place(&mut headers, &Method::POST, "/")
            .unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get_all(&SIGNATURE_HEADER).iter().count(), 1);
        assert_ne!(headers[&SIGNATURE_HEADER], "stale");
        assert_eq!(headers["accept"], "application/xml");
    }

    #[test]
    fn timestamps() {
        let signer = MessageSigner::builder()
            .key_id("alice-key-id")
            .key_resolver(store())
            .include_created(true)
            .expires_in(Duration::from_secs(60))
            .build();

        let (_name, value) = signer.sign(&headers(), &Method::POST, "/").unwrap();
        let params = header::parse(value.to_str().unwrap()).unwrap();

        let created = params.created.unwrap();
        let expires = params.expires.unwrap();
        assert!(expires >= created + 60);
        assert!(params.covers("(created)"));
        assert!(params.covers("(expires)"));
    }

    #[test]
    fn missing_header() {
        let signer = MessageSigner::builder()
            .key_id("alice-key-id")
            .key_resolver(store())
            .components(vec!["custom".to_string()])
            .build();

        let err = signer.sign(&headers(), &Method::GET, "/").unwrap_err();
        assert!(err.is_missing_header());
    }

    #[test]
    fn unknown_key() {
        let signer = MessageSigner::builder()
            .key_id("unknown-key-id")
            .key_resolver(store())
            .build();

        let err = signer.sign(&headers(), &Method::GET, "/").unwrap_err();
        assert!(matches!(err, Error::UnknownKeyId(ref key_id) if key_id == "unknown-key-id"));
    }

    #[test]
    fn key_algorithm_mismatch() {
        let signer = MessageSigner::builder()
            .key_id("bob-key-id")
            .key_resolver(store())
            .build();

        let err = signer.sign(&headers(), &Method::GET, "/").unwrap_err();
        assert!(matches!(err, Error::Signing(..)));

        let signer = MessageSigner::builder()
            .key_id("bob-key-id")
            .key_resolver(store())
            .algorithm(SignatureAlgorithm::Ed25519)
            .build();
        assert!(signer.sign(&headers(), &Method::GET, "/").is_ok());
    }
}
