//! bisect-guess: find the oracle's number by bisection over UDP.
//!
//! Exit status: 0 on WIN, 2 on LOSE, 1 on any error.

use fetch_guess::config::GuessConfig;
use fetch_guess::guess::{self, GameReport, GuessError, Outcome};
use fetch_guess::logging;
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_WON: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_LOST: u8 = 2;

/// Process exit status for a finished or aborted game.
fn exit_status(result: &Result<GameReport, GuessError>) -> u8 {
    match result {
        Ok(report) => match report.outcome {
            Outcome::Won => EXIT_WON,
            Outcome::Lost => EXIT_LOST,
        },
        Err(_) => EXIT_ERROR,
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = GuessConfig::load()?;
    logging::init(&config.log_level);

    info!(
        endpoint = %config.endpoint,
        low = config.low,
        high = config.high,
        timeout_ms = config.timeout.map(|t| t.as_millis() as u64),
        retransmits = config.retransmits,
        "Starting bisect guess"
    );

    let result = guess::run(&config);
    match &result {
        Ok(report) => {
            info!(
                outcome = ?report.outcome,
                exchanges = report.exchanges,
                last_guess = report.last_guess,
                "Game over"
            );
            match report.outcome {
                Outcome::Won => println!("I HAVE WON"),
                Outcome::Lost => println!("I HAVE LOST"),
            }
        }
        Err(e) => {
            error!(error = %e, "Game aborted");
            eprintln!("error: {e}");
        }
    }

    Ok(ExitCode::from(exit_status(&result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(outcome: Outcome) -> Result<GameReport, GuessError> {
        Ok(GameReport {
            outcome,
            exchanges: 6,
            last_guess: 17,
        })
    }

    #[test]
    fn test_win_exits_zero() {
        assert_eq!(exit_status(&finished(Outcome::Won)), 0);
    }

    #[test]
    fn test_lose_exits_two() {
        assert_eq!(exit_status(&finished(Outcome::Lost)), 2);
    }

    #[test]
    fn test_error_exits_one() {
        let timeout = Err(GuessError::Timeout {
            guess: 21,
            attempts: 4,
        });
        assert_eq!(exit_status(&timeout), 1);

        let unknown = Err(GuessError::UnknownToken {
            guess: 21,
            payload: b"MAYBE".to_vec(),
        });
        assert_eq!(exit_status(&unknown), 1);
    }
}
