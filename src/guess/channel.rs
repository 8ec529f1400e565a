//! UDP channel to the oracle.

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{GuessError, DEFAULT_RETRANSMITS, DEFAULT_TIMEOUT_MS, MAX_DATAGRAM};

/// How long to wait for a reply and how often to resend a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Reply timeout; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Resends of the same guess after a timeout.
    pub retransmits: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
            retransmits: DEFAULT_RETRANSMITS,
        }
    }
}

/// Datagram exchange with a single peer.
///
/// `recv` returns `WouldBlock` or `TimedOut` when the reply timeout elapses.
pub trait Datagrams {
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Drop every datagram already queued without waiting for more.
    /// Returns how many were dropped.
    fn discard_pending(&mut self) -> io::Result<usize>;
}

/// Unconnected UDP socket used to talk to one fixed oracle.
pub struct Channel {
    socket: UdpSocket,
    peer: SocketAddr,
    timeout: Option<Duration>,
}

impl Channel {
    /// Bind an ephemeral local port and apply the reply timeout.
    pub fn open(peer: SocketAddr, timeout: Option<Duration>) -> Result<Self, GuessError> {
        let (domain, local) = match peer {
            SocketAddr::V4(_) => (
                Domain::IPV4,
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            ),
            SocketAddr::V6(_) => (
                Domain::IPV6,
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
            ),
        };

        let socket =
            Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(GuessError::Socket)?;
        socket
            .bind(&SockAddr::from(local))
            .map_err(GuessError::Socket)?;
        socket
            .set_read_timeout(timeout)
            .map_err(GuessError::Socket)?;

        Ok(Self {
            socket: socket.into(),
            peer,
            timeout,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Wait for a datagram from the peer, skipping any other source.
    ///
    /// Skipped datagrams do not extend the wait: the read timeout is cut to
    /// whatever is left until `deadline`.
    fn recv_from_peer(&self, buf: &mut [u8], deadline: Option<Instant>) -> io::Result<usize> {
        loop {
            let (n, from) = self.socket.recv_from(buf)?;
            if from == self.peer {
                return Ok(n);
            }
            warn!(from = %from, size = n, "Discarding datagram from unexpected peer");

            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(io::Error::from(io::ErrorKind::TimedOut));
                }
                self.socket.set_read_timeout(Some(remaining))?;
            }
        }
    }
}

impl Datagrams for Channel {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let n = self.socket.send_to(payload, self.peer)?;
        if n != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: sent {n} of {} bytes", payload.len()),
            ));
        }
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let result = self.recv_from_peer(buf, deadline);
        if deadline.is_some() {
            self.socket.set_read_timeout(self.timeout)?;
        }
        result
    }

    fn discard_pending(&mut self) -> io::Result<usize> {
        self.socket.set_nonblocking(true)?;

        let mut buf = [0u8; MAX_DATAGRAM];
        let mut discarded = 0;
        let result = loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    debug!(from = %from, size = n, "Discarding stale datagram");
                    discarded += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(discarded),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };

        self.socket.set_nonblocking(false)?;
        result
    }
}

/// True for the error kinds a read timeout produces on the supported platforms.
pub(crate) fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
