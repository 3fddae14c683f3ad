use crate::util::success_kaomoji;

pub fn do_it(header: String) -> miette::Result<()> {
    let params = match kakuin::header::parse(&header) {
        Ok(params) => params,
        Err(err) => return Err(miette::Error::new(err).with_source_code(header)),
    };

    println!("✅ Header is valid! {}", success_kaomoji());
    println!("keyId: {}", params.key_id);
    if let Some(algorithm) = params.algorithm {
        println!("algorithm: {algorithm}");
    }
    println!("headers: {}", params.headers.join(" "));

    Ok(())
}
