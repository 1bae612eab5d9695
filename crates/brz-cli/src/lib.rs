//! # brz-cli
//!
//! Breeze cluster administration client.
//!
//! One invocation runs one command against one cluster:
//! - connect to a bridge endpoint and handshake
//! - wait until the cluster's agent (and, for indexing, its channel) is known
//! - issue the command and print the result
//! - optionally remember the bridge addresses that were used
//!
//! # Architecture
//!
//! The client talks to the bridge service over WebSocket using the protocol
//! in `brz-proto`. [`session::Session`] owns the socket and a pump task;
//! everything above it goes through the [`client::BridgeApi`] trait.
//!
//! ```text
//! ┌─────────┐   brz-proto (WebSocket)   ┌────────┐        ┌─────────┐
//! │ brz-cli │◄─────────────────────────►│ bridge │◄──────►│ cluster │
//! └─────────┘                           └────────┘        └─────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address_book;
pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod params;
pub mod router;
pub mod session;
pub mod topology;

pub use address_book::ContactList;
pub use cli::Cli;
pub use client::{BridgeApi, BridgeClient};
pub use config::BridgeConfig;
pub use error::CliError;
pub use output::OutputFormat;
pub use router::{Command, CommandOutcome};
pub use session::Session;
pub use topology::{RetryPolicy, TopologyResolver};
