//! Deployment plumbing: configuration, data files, and channel bring-up.

pub mod config;
pub mod files;
pub mod gen;

use serio::codec::Bincode;
use tokio::net::TcpStream;
use tokio_util::codec::LengthDelimitedCodec;

/// Framed typed channel over a TCP stream.
pub type Channel = serio::Framed<tokio_util::codec::Framed<TcpStream, LengthDelimitedCodec>, Bincode>;

/// Wraps a TCP stream in the length-delimited bincode framing used on every
/// link.
pub fn framed(stream: TcpStream) -> Channel {
    serio::Framed::new(LengthDelimitedCodec::builder().new_framed(stream), Bincode)
}

/// Installs the fmt subscriber, honoring `RUST_LOG` and defaulting to info.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
