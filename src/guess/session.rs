//! Bisection state machine.

use tracing::{debug, info, warn};

use super::channel::{is_timeout, Datagrams};
use super::protocol::{encode_guess, ResponseToken, MAX_DATAGRAM};
use super::{GuessError, SearchInterval};

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// Summary of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameReport {
    pub outcome: Outcome,
    /// Guesses that got a reply.
    pub exchanges: u32,
    /// The guess the terminal token answered.
    pub last_guess: i64,
}

/// One guessing game against an oracle.
#[derive(Debug, Clone)]
pub struct Session {
    interval: SearchInterval,
    exchanges: u32,
}

impl Session {
    pub fn new(interval: SearchInterval) -> Self {
        Self {
            interval,
            exchanges: 0,
        }
    }

    /// Current candidate range.
    pub fn interval(&self) -> SearchInterval {
        self.interval
    }

    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    /// The value to send next.
    pub fn next_guess(&self) -> i64 {
        self.interval.midpoint()
    }

    /// Apply the oracle's answer to `guess`.
    ///
    /// Returns the outcome for terminal tokens, `None` when the game goes on.
    pub fn apply(&mut self, guess: i64, token: ResponseToken) -> Result<Option<Outcome>, GuessError> {
        self.exchanges += 1;

        let narrowed = match token {
            ResponseToken::Win => return Ok(Some(Outcome::Won)),
            ResponseToken::Lose => return Ok(Some(Outcome::Lost)),
            ResponseToken::Less => self.interval.raise_low(guess),
            ResponseToken::More => self.interval.lower_high(guess),
        };

        narrowed.map_err(|_| GuessError::Inconsistent {
            guess,
            token,
            interval: self.interval,
        })?;

        debug!(interval = %self.interval, "Narrowed");
        Ok(None)
    }

    /// Play until the oracle sends a terminal token.
    pub fn play<D: Datagrams>(
        mut self,
        channel: &mut D,
        retransmits: u32,
    ) -> Result<GameReport, GuessError> {
        let mut buf = [0u8; MAX_DATAGRAM];

        loop {
            let guess = self.next_guess();
            let request = encode_guess(guess);

            // Anything queued now answers an earlier guess.
            let stale = channel.discard_pending().map_err(GuessError::Receive)?;
            if stale > 0 {
                warn!(count = stale, "Dropped stale replies before sending guess");
            }
            info!(guess, "Sending guess");

            let (n, attempts) = exchange(channel, &request, &mut buf, guess, retransmits)?;
            let payload = &buf[..n];

            let token = ResponseToken::parse(payload).ok_or_else(|| GuessError::UnknownToken {
                guess,
                payload: payload.to_vec(),
            })?;
            debug!(guess, %token, "Oracle replied");

            if attempts > 1 && !token.is_terminal() {
                absorb_duplicates(channel, attempts - 1)?;
            }

            if let Some(outcome) = self.apply(guess, token)? {
                return Ok(GameReport {
                    outcome,
                    exchanges: self.exchanges,
                    last_guess: guess,
                });
            }
        }
    }
}

/// Send `request` and wait for one reply, resending after each timeout.
///
/// Returns the reply length and how many copies of the request went out.
fn exchange<D: Datagrams>(
    channel: &mut D,
    request: &[u8],
    buf: &mut [u8],
    guess: i64,
    retransmits: u32,
) -> Result<(usize, u32), GuessError> {
    let mut attempts = 0u32;

    loop {
        channel.send(request).map_err(GuessError::Send)?;
        attempts += 1;

        loop {
            match channel.recv(buf) {
                Ok(n) => return Ok((n, attempts)),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => break,
                Err(e) => return Err(GuessError::Receive(e)),
            }
        }

        if attempts > retransmits {
            return Err(GuessError::Timeout { guess, attempts });
        }
        warn!(guess, attempt = attempts + 1, "No reply, resending guess");
    }
}

/// Consume up to `expected` late replies to copies of a guess that has
/// already been answered. Stops at the first timeout; whatever arrives
/// later is dropped by `discard_pending` before the next guess.
fn absorb_duplicates<D: Datagrams>(channel: &mut D, expected: u32) -> Result<(), GuessError> {
    let mut scratch = [0u8; MAX_DATAGRAM];
    let mut absorbed = 0;

    while absorbed < expected {
        match channel.recv(&mut scratch) {
            Ok(n) => {
                debug!(size = n, "Dropped duplicate reply");
                absorbed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(&e) => break,
            Err(e) => return Err(GuessError::Receive(e)),
        }
    }

    Ok(())
}
