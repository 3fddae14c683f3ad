//!
//! Easy HTTP signature handling for `http` messages
//!
//! Integrates with async. Cryptographic operations run on tokio's blocking pool.
//!

use crate::{
    algorithm::DigestAlgorithm,
    crypto::{PrivateKey, PublicKey},
    digest::{self, DIGEST_HEADER},
    key::KeyResolver,
    signer::MessageSigner,
    verifier::{Accepted, MessageVerifier, Rejection},
};
use http::{header::DATE, HeaderMap, HeaderValue, Method, Request, Response, Uri};
use miette::Diagnostic;
use std::{borrow::Borrow, sync::Arc, time::SystemTime};
use thiserror::Error;
use tracing::{debug, instrument};

/// Easy module error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Blocking pool task failed
    #[error(transparent)]
    Blocking(#[from] tokio::task::JoinError),

    /// Message was rejected
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Signing failed
    #[error(transparent)]
    Signing(#[from] crate::Error),
}

fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map_or_else(|| uri.path(), |path_and_query| path_and_query.as_str())
        .to_string()
}

fn prepare(headers: &mut HeaderMap, digest_algorithm: DigestAlgorithm, body: &[u8]) {
    if !headers.contains_key(DATE) {
        let date = httpdate::fmt_http_date(SystemTime::now());
        if let Ok(date) = HeaderValue::from_str(&date) {
            headers.insert(DATE, date);
        }
    }

    if !body.is_empty() && !headers.contains_key(&DIGEST_HEADER) {
        headers.insert(&DIGEST_HEADER, digest::header_value(digest_algorithm, body));
    }
}

fn check_digest(
    headers: &HeaderMap,
    expected: DigestAlgorithm,
    body: &[u8],
) -> Result<(), Rejection> {
    let Some(value) = headers.get(&DIGEST_HEADER) else {
        return Ok(());
    };

    match digest::algorithm(value) {
        Ok(algorithm) if algorithm == expected => {}
        Ok(algorithm) => {
            debug!(%algorithm, %expected, "unexpected digest algorithm");
            return Err(Rejection::DigestMismatch);
        }
        Err(error) => {
            debug!(%error, "malformed digest header");
            return Err(Rejection::DigestMismatch);
        }
    }

    match digest::verify(value, body) {
        Ok(true) => Ok(()),
        Ok(false) => Err(Rejection::DigestMismatch),
        Err(error) => {
            debug!(%error, "malformed digest header");
            Err(Rejection::DigestMismatch)
        }
    }
}

async fn sign_headers<R>(
    signer: Arc<MessageSigner<R>>,
    headers: HeaderMap,
    method: Method,
    path: String,
) -> Result<HeaderMap, Error>
where
    R: KeyResolver + Send + Sync + 'static,
    R::Key: Borrow<PrivateKey>,
{
    let headers = tokio::task::spawn_blocking(move || {
        let mut headers = headers;
        signer
            .sign_in_place(&mut headers, &method, &path)
            .map(|()| headers)
    })
    .await??;

    Ok(headers)
}

async fn verify_headers<R>(
    verifier: Arc<MessageVerifier<R>>,
    headers: HeaderMap,
    method: Method,
    path: String,
) -> Result<Accepted, Error>
where
    R: KeyResolver + Send + Sync + 'static,
    R::Key: Borrow<PublicKey>,
{
    let accepted =
        tokio::task::spawn_blocking(move || verifier.verify(&headers, &method, &path)).await??;

    Ok(accepted)
}

/// Sign an HTTP request
///
/// Sets the `Date` header and, for non-empty bodies, the `Digest` header if they are absent
#[instrument(skip_all)]
pub async fn sign_request<B, R>(
    req: Request<B>,
    signer: Arc<MessageSigner<R>>,
) -> Result<Request<B>, Error>
where
    B: AsRef<[u8]>,
    R: KeyResolver + Send + Sync + 'static,
    R::Key: Borrow<PrivateKey>,
{
    let (mut parts, body) = req.into_parts();
    prepare(&mut parts.headers, signer.algorithm().digest, body.as_ref());

    let path = path_and_query(&parts.uri);
    parts.headers = sign_headers(signer, parts.headers, parts.method.clone(), path).await?;

    Ok(Request::from_parts(parts, body))
}

/// Verify an HTTP request
///
/// After the signature checks out, the `Digest` header (if present) is checked against the body.
/// It has to name the digest algorithm the verifier is configured with.
#[instrument(skip_all)]
pub async fn verify_request<B, R>(
    req: &Request<B>,
    verifier: Arc<MessageVerifier<R>>,
) -> Result<Accepted, Error>
where
    B: AsRef<[u8]>,
    R: KeyResolver + Send + Sync + 'static,
    R::Key: Borrow<PublicKey>,
{
    let digest_algorithm = verifier.digest_algorithm();
    let accepted = verify_headers(
        verifier,
        req.headers().clone(),
        req.method().clone(),
        path_and_query(req.uri()),
    )
    .await?;

    check_digest(req.headers(), digest_algorithm, req.body().as_ref())?;

    Ok(accepted)
}

/// Sign an HTTP response
///
/// `method` and `path` are the ones of the request the response answers
#[instrument(skip_all)]
pub async fn sign_response<B, R>(
    res: Response<B>,
    method: &Method,
    path: &str,
    signer: Arc<MessageSigner<R>>,
) -> Result<Response<B>, Error>
where
    B: AsRef<[u8]>,
    R: KeyResolver + Send + Sync + 'static,
    R::Key: Borrow<PrivateKey>,
{
    let (mut parts, body) = res.into_parts();
    prepare(&mut parts.headers, signer.algorithm().digest, body.as_ref());

    parts.headers = sign_headers(signer, parts.headers, method.clone(), path.to_string()).await?;

    Ok(Response::from_parts(parts, body))
}

/// Verify an HTTP response
///
/// `method` and `path` are the ones of the request the response answers
#[instrument(skip_all)]
pub async fn verify_response<B, R>(
    res: &Response<B>,
    method: &Method,
    path: &str,
    verifier: Arc<MessageVerifier<R>>,
) -> Result<Accepted, Error>
where
    B: AsRef<[u8]>,
    R: KeyResolver + Send + Sync + 'static,
    R::Key: Borrow<PublicKey>,
{
    let digest_algorithm = verifier.digest_algorithm();
    let accepted = verify_headers(
        verifier,
        res.headers().clone(),
        method.clone(),
        path.to_string(),
    )
    .await?;

    check_digest(res.headers(), digest_algorithm, res.body().as_ref())?;

    Ok(accepted)
}
