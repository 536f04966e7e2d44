use clap::{ArgAction, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Options {
    /// Logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Socket address to listen on
    #[arg(short, long, default_value = "0.0.0.0:1900")]
    pub listen: SocketAddr,

    /// Root directory to serve
    pub root: PathBuf,
}
