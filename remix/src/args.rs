use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Remix image variation server
#[derive(Debug, Parser)]
#[command(name = "remix", about = "Turns an uploaded image and a description into four styled variations")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "remix.toml", env = "REMIX_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "REMIX_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["remix"]).unwrap();
        assert_eq!(args.config, PathBuf::from("remix.toml"));
        assert!(args.listen.is_none());
    }

    #[test]
    fn listen_override() {
        let args = Args::try_parse_from(["remix", "--listen", "127.0.0.1:8080", "-c", "other.toml"]).unwrap();
        assert_eq!(args.listen, Some("127.0.0.1:8080".parse().unwrap()));
        assert_eq!(args.config, PathBuf::from("other.toml"));
    }
}
