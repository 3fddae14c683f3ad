use self::args::{ToolArgs, ToolSubcommand};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod message;
mod parse_header;
mod sign;
mod util;
mod verify;

fn main() -> miette::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = ToolArgs::parse();
    match args.subcommand {
        ToolSubcommand::ParseHeader(args) => parse_header::do_it(args.header),
        ToolSubcommand::Sign(args) => sign::do_it(args),
        ToolSubcommand::Verify(args) => verify::do_it(args),
    }
}
