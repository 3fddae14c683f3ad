use criterion::{criterion_group, criterion_main, Criterion};
use http::{HeaderMap, HeaderValue, Method};
use kakuin::{canonical, header};
use std::hint::black_box;

const SIGNATURE_HEADER: &str = r#"keyId="Test",algorithm="rsa-sha256",headers="(request-target) host date content-type digest content-length",signature="AAAA""#;

fn headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Host", HeaderValue::from_static("example.com"));
    headers.insert(
        "Date",
        HeaderValue::from_static("Sun, 05 Jan 2014 21:31:40 GMT"),
    );
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    headers.insert(
        "Digest",
        HeaderValue::from_static("SHA-256=X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE="),
    );
    headers.insert("Content-Length", HeaderValue::from_static("18"));
    headers
}

fn build_signature_string(c: &mut Criterion) {
    let params = header::parse(SIGNATURE_HEADER).unwrap();
    let headers = headers();

    c.bench_function("build_signature_string", |b| {
        b.iter(|| {
            canonical::construct(
                black_box(params.components()),
                black_box(&Method::POST),
                black_box("/foo?param=value&pet=dog"),
                black_box(&headers),
                black_box(params.timestamps()),
            )
        });
    });
}

criterion_group!(benches, build_signature_string);
criterion_main!(benches);
