use crate::{args::MessageArgs, message::Message};
use tracing::info;

pub fn do_it(args: MessageArgs) -> miette::Result<()> {
    let message = Message::from_args(args)?;
    let signer = kakuin::config::signer(&message.properties)?;

    let (name, value) = signer.sign(&message.headers, &message.method, &message.path)?;
    info!(key_id = signer.key_id(), "signed message");

    println!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));

    Ok(())
}
