//! stream-fetch: send an identity over TCP and save everything the server
//! sends back until it closes the connection.

use fetch_guess::config::FetchConfig;
use fetch_guess::{fetch, logging};
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = FetchConfig::load()?;

    // Initialize logging
    logging::init(&config.log_level);

    info!(
        endpoint = %config.endpoint,
        artifact = %config.artifact.display(),
        chunk_size = config.chunk_size,
        "Starting stream fetch"
    );

    match fetch::run(&config) {
        Ok(report) => {
            info!(
                chunks = report.chunks,
                bytes = report.bytes,
                artifact = %config.artifact.display(),
                "Remote closed the connection"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Fetch failed");
            Err(e.into())
        }
    }
}
