use http::{header::DATE, Method, Request, Response, StatusCode};
use kakuin::{
    digest::DIGEST_HEADER,
    easy::{self, Error},
    DigestAlgorithm, MessageVerifier, Rejection, SIGNATURE_HEADER,
};
use std::sync::Arc;


#[tokio::test]
async fn request_round_trip() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/httpsig/bookstore/books?sort=title")
        .header("Content-Type", "application/xml")
        .body(b"<book><name>Rust</name></book>".to_vec())
        .unwrap();

    let signer = Arc::new(self::data::signer("alice-key-id"));
    let verifier = Arc::new(self::data::verifier());

    let signed = easy::sign_request(req, signer).await.unwrap();
    assert!(signed.headers().contains_key(DATE));
    assert!(signed.headers().contains_key(&DIGEST_HEADER));
    assert!(signed.headers().contains_key(&SIGNATURE_HEADER));

    let accepted = easy::verify_request(&signed, verifier).await.unwrap();
    assert_eq!(accepted.key_id, "alice-key-id");
    assert!(accepted.components.iter().any(|component| component == "digest"));
}

#[tokio::test]
async fn empty_body_has_no_digest() {
    let req = Request::builder()
        .method(Method::GET)
        .uri("/httpsig/bookstore/books")
        .body(Vec::new())
        .unwrap();

    let signed = easy::sign_request(req, Arc::new(self::data::signer("alice-key-id")))
        .await
        .unwrap();

    assert!(!signed.headers().contains_key(&DIGEST_HEADER));
    assert!(easy::verify_request(&signed, Arc::new(self::data::verifier()))
        .await
        .is_ok());
}

#[tokio::test]
async fn tampered_body() {
    let signed = easy::sign_request(
        self::data::get_request(),
        Arc::new(self::data::signer("alice-key-id")),
    )
    .await
    .unwrap();

    let (parts, _body) = signed.into_parts();
    let tampered = Request::from_parts(parts, br#"{"hello": "mallory"}"#.to_vec());

    let err = easy::verify_request(&tampered, Arc::new(self::data::verifier()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rejected(Rejection::DigestMismatch)));
}

#[tokio::test]
async fn digest_algorithm_mismatch() {
    let signed = easy::sign_request(
        self::data::get_request(),
        Arc::new(self::data::signer("alice-key-id")),
    )
    .await
    .unwrap();

    let verifier = MessageVerifier::builder()
        .key_resolver(self::data::verifying_keys())
        .digest_algorithm(DigestAlgorithm::Sha512)
        .build();

    let err = easy::verify_request(&signed, Arc::new(verifier))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rejected(Rejection::DigestMismatch)));
}

#[tokio::test]
async fn response_round_trip() {
    let res = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/xml")
        .body(b"<book><name>Rust</name></book>".to_vec())
        .unwrap();

    let signed = easy::sign_response(
        res,
        &Method::GET,
        "/httpsig/bookstore/books",
        Arc::new(self::data::signer("bob-key-id")),
    )
    .await;
    // The default signer uses rsa-sha256, which Bob's Ed25519 key can't produce
    assert!(matches!(signed, Err(Error::Signing(..))));

    let res = Response::builder()
        .status(StatusCode::OK)
        .body(b"<book><name>Rust</name></book>".to_vec())
        .unwrap();
    let signed = easy::sign_response(
        res,
        &Method::GET,
        "/httpsig/bookstore/books",
        Arc::new(self::data::signer("alice-key-id")),
    )
    .await
    .unwrap();

    let verifier = Arc::new(self::data::verifier());
    assert!(easy::verify_response(
        &signed,
        &Method::GET,
        "/httpsig/bookstore/books",
        verifier.clone()
    )
    .await
    .is_ok());

    let err = easy::verify_response(&signed, &Method::POST, "/httpsig/bookstore/books", verifier)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rejected(Rejection::SignatureMismatch)));
}
