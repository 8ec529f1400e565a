//! Stream fetch client.
//!
//! Connects to a fixed TCP endpoint, sends an identity string once and
//! copies every byte the remote sends into a local artifact until the remote
//! closes the connection.
//!
//! ## Protocol Format
//!
//! ```text
//! Client -> Server:  <identity bytes>          (no length prefix, no terminator)
//! Server -> Client:  <arbitrary byte stream>   (ends when the server closes)
//! ```
//!
//! The received bytes are stored verbatim. The default artifact name says
//! SVG, but nothing checks that the content is one.

mod artifact;
mod client;

pub use artifact::Artifact;
pub use client::{connect, receive_loop, run, send_identity, FetchReport};

use std::net::SocketAddr;
use std::path::PathBuf;

/// Compiled-in remote endpoint.
pub const DEFAULT_ENDPOINT: &str = "158.160.145.207:2001";

/// Compiled-in identity string.
pub const DEFAULT_IDENTITY: &str = "stream-fetch";

/// Compiled-in artifact path.
pub const DEFAULT_ARTIFACT: &str = "image.svg";

/// Receive chunk size
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Stream fetch errors
#[derive(Debug)]
pub enum FetchError {
    /// Socket could not be created.
    Socket(std::io::Error),
    /// Remote unreachable or refused the connection.
    Connect(SocketAddr, std::io::Error),
    /// Identity could not be written in full.
    Send(std::io::Error),
    /// Artifact could not be created or truncated.
    Create(PathBuf, std::io::Error),
    /// Received bytes could not be stored.
    Write(std::io::Error),
    /// Transport failure while streaming, after `received` bytes.
    Receive {
        received: u64,
        source: std::io::Error,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Socket(e) => write!(f, "Failed to create socket: {e}"),
            FetchError::Connect(addr, e) => write!(f, "Failed to connect to {addr}: {e}"),
            FetchError::Send(e) => write!(f, "Failed to send identity: {e}"),
            FetchError::Create(path, e) => {
                write!(f, "Failed to create artifact '{}': {}", path.display(), e)
            }
            FetchError::Write(e) => write!(f, "Failed to write artifact: {e}"),
            FetchError::Receive { received, source } => {
                write!(f, "Connection failed after {received} bytes: {source}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Socket(e)
            | FetchError::Connect(_, e)
            | FetchError::Send(e)
            | FetchError::Create(_, e)
            | FetchError::Write(e) => Some(e),
            FetchError::Receive { source, .. } => Some(source),
        }
    }
}
