//! `agentdesk` - Client book service for insurance sales agents
//!
//! This library provides the flat-file client store, the HTTP API that the
//! agent dashboard talks to, and the configuration and logging shared by
//! the `agentdesk` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{AdditionalField, Client, ClientId, ClientNotes, RecordId};
pub use storage::{ClientStore, StoreStats};
