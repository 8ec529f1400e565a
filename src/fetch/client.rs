//! Connection setup and the receive loop.

use bytes::BytesMut;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tracing::{debug, info, trace};

use super::{Artifact, FetchError};
use crate::config::FetchConfig;

/// Summary of a completed transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Reads that returned at least one byte.
    pub chunks: u64,
    /// Total bytes stored.
    pub bytes: u64,
}

/// Run one fetch: connect, send the identity, store the reply stream.
///
/// The artifact is only created once the identity has been sent, so a
/// failed connect leaves any existing file untouched. Socket and file are
/// released by drop on every path.
pub fn run(config: &FetchConfig) -> Result<FetchReport, FetchError> {
    let mut conn = connect(config.endpoint, config.connect_timeout)?;
    info!(endpoint = %config.endpoint, "Connected");

    send_identity(&mut conn, &config.identity)?;
    debug!(identity = %config.identity, "Identity sent");

    let mut artifact = Artifact::create(&config.artifact)
        .map_err(|e| FetchError::Create(config.artifact.clone(), e))?;

    let report = receive_loop(&mut conn, &mut artifact, config.chunk_size)?;
    artifact.finish().map_err(FetchError::Write)?;

    Ok(report)
}

/// Open a TCP connection to `endpoint`.
///
/// With `timeout` set, connect gives up after that long instead of waiting
/// for the OS.
pub fn connect(endpoint: SocketAddr, timeout: Option<Duration>) -> Result<TcpStream, FetchError> {
    let socket = Socket::new(
        match endpoint {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        },
        Type::STREAM,
        Some(Protocol::TCP),
    )
    .map_err(FetchError::Socket)?;

    let addr = SockAddr::from(endpoint);
    match timeout {
        Some(timeout) => socket.connect_timeout(&addr, timeout),
        None => socket.connect(&addr),
    }
    .map_err(|e| FetchError::Connect(endpoint, e))?;

    Ok(socket.into())
}

/// Write the identity once, as raw bytes with no framing.
///
/// Short writes are continued until every byte is out; a write that makes
/// no progress is reported as `WriteZero`.
pub fn send_identity<W: Write>(conn: &mut W, identity: &str) -> Result<(), FetchError> {
    conn.write_all(identity.as_bytes())
        .and_then(|()| conn.flush())
        .map_err(FetchError::Send)
}

/// Copy the stream into `sink` until the remote closes it.
///
/// Each read fills at most `chunk_size` bytes and only the bytes actually
/// read are forwarded. A zero-length read ends the loop successfully; a
/// read error ends it with [`FetchError::Receive`].
pub fn receive_loop<R: Read, W: Write>(
    conn: &mut R,
    sink: &mut W,
    chunk_size: usize,
) -> Result<FetchReport, FetchError> {
    let mut chunk = BytesMut::zeroed(chunk_size.max(1));
    let mut report = FetchReport::default();

    loop {
        let n = match conn.read(&mut chunk[..]) {
            Ok(0) => {
                trace!("Connection closed by remote");
                return Ok(report);
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(FetchError::Receive {
                    received: report.bytes,
                    source: e,
                })
            }
        };

        debug!(size = n, "Received chunk");
        sink.write_all(&chunk[..n]).map_err(FetchError::Write)?;

        report.chunks += 1;
        report.bytes += n as u64;
    }
}
