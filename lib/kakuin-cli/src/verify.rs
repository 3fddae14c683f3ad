use crate::{
    args::MessageArgs,
    message::Message,
    util::{error_kaomoji, success_kaomoji},
};

pub fn do_it(args: MessageArgs) -> miette::Result<()> {
    let message = Message::from_args(args)?;
    let verifier = kakuin::config::verifier(&message.properties)?;

    match verifier.verify(&message.headers, &message.method, &message.path) {
        Ok(accepted) => {
            println!(
                "✅ Signature by `{}` is valid! {}",
                accepted.key_id,
                success_kaomoji()
            );
            Ok(())
        }
        Err(rejection) => {
            eprintln!("❌ Signature was rejected {}", error_kaomoji());
            Err(rejection.into())
        }
    }
}
