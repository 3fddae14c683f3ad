use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args)]
pub struct ParseHeaderArgs {
    /// The header to parse
    pub header: String,
}

#[derive(Args)]
pub struct MessageArgs {
    /// Properties file configuring keys and algorithms
    #[arg(long, short)]
    pub config: PathBuf,

    /// HTTP method of the request
    #[arg(default_value = "GET", long, short)]
    pub method: String,

    /// Path (and query) of the request
    #[arg(default_value = "/", long, short)]
    pub path: String,

    /// Header of the message, in the form `Name: value`
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,
}

#[derive(Subcommand)]
pub enum ToolSubcommand {
    /// Parse the HTTP Signature header and report any format errors
    ParseHeader(ParseHeaderArgs),

    /// Sign an HTTP message and print the Signature header
    Sign(MessageArgs),

    /// Verify the Signature header of an HTTP message
    Verify(MessageArgs),
}

#[derive(Parser)]
#[command(about, version)]
pub struct ToolArgs {
    #[clap(subcommand)]
    pub subcommand: ToolSubcommand,
}
