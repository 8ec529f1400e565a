//! Bisection guess client.
//!
//! Plays "guess the number" against a remote oracle over UDP. Each guess is
//! the midpoint of the remaining candidate range; the oracle's reply either
//! halves the range or ends the game.
//!
//! ## Protocol Format
//!
//! ```text
//! Request:  <decimal integer>            e.g. 21
//! Response: MORE | LESS | WIN | LOSE
//! ```
//!
//! One value per datagram, no framing, no sequence numbers. `LESS` means the
//! guess was below the secret, `MORE` that it was above.
//!
//! ## Loss handling
//!
//! A reply that does not arrive within the configured timeout causes the
//! same guess to be resent, up to a fixed number of times. Without sequence
//! numbers a late reply to an earlier copy cannot be told apart from a fresh
//! one, so the first reply is taken and the oracle's answers to the other
//! copies are dropped: after a resent guess is answered the client waits
//! one more timeout for each extra copy, and before every new guess it
//! discards whatever is still queued on the socket.

mod channel;
mod interval;
mod protocol;
mod session;

pub use channel::{Channel, Datagrams, RetryPolicy};
pub use interval::{Exhausted, SearchInterval};
pub use protocol::{encode_guess, ResponseToken, MAX_DATAGRAM};
pub use session::{GameReport, Outcome, Session};

use tracing::info;

use crate::config::GuessConfig;

/// Compiled-in oracle endpoint.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:2000";

/// Lowest candidate (inclusive).
pub const DEFAULT_LOW: i64 = 0;

/// Highest candidate (inclusive).
pub const DEFAULT_HIGH: i64 = 42;

pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

pub const DEFAULT_RETRANSMITS: u32 = 3;

/// Open a channel to the configured oracle and play one game.
pub fn run(config: &GuessConfig) -> Result<GameReport, GuessError> {
    let interval = SearchInterval::new(config.low, config.high).ok_or(GuessError::EmptyInterval {
        low: config.low,
        high: config.high,
    })?;
    let policy = RetryPolicy {
        timeout: config.timeout,
        retransmits: config.retransmits,
    };

    let mut channel = Channel::open(config.endpoint, policy.timeout)?;
    info!(
        oracle = %channel.peer(),
        interval = %interval,
        candidates = interval.candidates(),
        "Starting game"
    );

    Session::new(interval).play(&mut channel, policy.retransmits)
}

/// Bisection guess errors
#[derive(Debug)]
pub enum GuessError {
    /// The starting range has no candidates.
    EmptyInterval { low: i64, high: i64 },
    /// Socket could not be created, bound or configured.
    Socket(std::io::Error),
    /// A guess could not be sent.
    Send(std::io::Error),
    /// Receiving a reply failed for a reason other than a timeout.
    Receive(std::io::Error),
    /// No reply after all retransmissions.
    Timeout { guess: i64, attempts: u32 },
    /// The reply was not one of the four tokens.
    UnknownToken { guess: i64, payload: Vec<u8> },
    /// The reply would rule out every remaining candidate.
    Inconsistent {
        guess: i64,
        token: ResponseToken,
        interval: SearchInterval,
    },
}

impl std::fmt::Display for GuessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuessError::EmptyInterval { low, high } => {
                write!(f, "Search interval [{low}, {high}] is empty")
            }
            GuessError::Socket(e) => write!(f, "Failed to set up socket: {e}"),
            GuessError::Send(e) => write!(f, "Failed to send guess: {e}"),
            GuessError::Receive(e) => write!(f, "Failed to receive reply: {e}"),
            GuessError::Timeout { guess, attempts } => {
                write!(f, "No reply to guess {guess} after {attempts} attempts")
            }
            GuessError::UnknownToken { guess, payload } => write!(
                f,
                "Unrecognized reply to guess {guess}: {:?}",
                String::from_utf8_lossy(payload)
            ),
            GuessError::Inconsistent {
                guess,
                token,
                interval,
            } => write!(
                f,
                "Reply {token} to guess {guess} contradicts earlier replies (candidates {interval})"
            ),
        }
    }
}

impl std::error::Error for GuessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuessError::Socket(e) | GuessError::Send(e) | GuessError::Receive(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::thread;
    use std::time::Duration;

    /// Run a truthful oracle for `target` on loopback, ignoring the first
    /// `drop_first` datagrams and sleeping `first_delay` before its first
    /// reply. Returns its address and the guesses it answered.
    fn spawn_oracle(
        target: i64,
        drop_first: usize,
        first_delay: Duration,
    ) -> (std::net::SocketAddr, thread::JoinHandle<Vec<i64>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut answered = Vec::new();
            let mut dropped = 0;
            let mut buf = [0u8; MAX_DATAGRAM];
            loop {
                let (n, from) = socket.recv_from(&mut buf).unwrap();
                if dropped < drop_first {
                    dropped += 1;
                    continue;
                }
                let guess: i64 = std::str::from_utf8(&buf[..n]).unwrap().parse().unwrap();
                if answered.is_empty() {
                    thread::sleep(first_delay);
                }
                answered.push(guess);
                let token = match guess.cmp(&target) {
                    std::cmp::Ordering::Less => ResponseToken::Less,
                    std::cmp::Ordering::Greater => ResponseToken::More,
                    std::cmp::Ordering::Equal => ResponseToken::Win,
                };
                socket.send_to(token.as_bytes(), from).unwrap();
                if token.is_terminal() {
                    return answered;
                }
            }
        });

        (addr, handle)
    }

    fn guess_config(endpoint: std::net::SocketAddr, timeout: Option<Duration>) -> GuessConfig {
        GuessConfig {
            endpoint,
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
            timeout,
            retransmits: DEFAULT_RETRANSMITS,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_run_against_loopback_oracle() {
        let (addr, oracle) = spawn_oracle(17, 0, Duration::ZERO);
        let report = run(&guess_config(addr, Some(Duration::from_secs(2)))).unwrap();

        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.exchanges, 6);
        assert_eq!(oracle.join().unwrap(), vec![21, 10, 15, 18, 16, 17]);
    }

    #[test]
    fn test_run_recovers_from_lost_datagram() {
        let (addr, oracle) = spawn_oracle(42, 1, Duration::ZERO);
        let report = run(&guess_config(addr, Some(Duration::from_millis(100)))).unwrap();

        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.last_guess, 42);
        assert_eq!(oracle.join().unwrap().first(), Some(&21));
    }

    #[test]
    fn test_run_survives_late_reply() {
        // The first reply comes after the timeout, so 21 goes out twice and
        // is answered twice. The second MORE must not steer the next guess.
        let (addr, oracle) = spawn_oracle(17, 0, Duration::from_millis(150));
        let report = run(&guess_config(addr, Some(Duration::from_millis(100)))).unwrap();

        assert_eq!(report.outcome, Outcome::Won);
        assert_eq!(report.last_guess, 17);
        assert_eq!(report.exchanges, 6);
        assert_eq!(oracle.join().unwrap(), vec![21, 21, 10, 15, 18, 16, 17]);
    }

    #[test]
    fn test_run_rejects_empty_interval() {
        let mut config = guess_config("127.0.0.1:9".parse().unwrap(), None);
        config.low = 10;
        config.high = 9;

        match run(&config) {
            Err(GuessError::EmptyInterval { low, high }) => assert_eq!((low, high), (10, 9)),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
