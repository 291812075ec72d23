//! HTTP implementation of the console's backend port.
//!
//! `ConsoleClient` knows the route and body of every operation; status codes
//! and transport failures are interpreted only in `http`.

mod client;
mod http;

pub use client::{ConsoleClient, USER_AGENT_VALUE};
