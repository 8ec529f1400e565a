//! fetch-guess: two small blocking network clients
//!
//! - `fetch`: send an identity over TCP and store the reply stream in a file
//! - `guess`: play a bisection guessing game against a UDP oracle
//!
//! The two clients share nothing but configuration loading and logging
//! setup. Both run on the calling thread with blocking std sockets.

pub mod config;
pub mod fetch;
pub mod guess;
pub mod logging;
