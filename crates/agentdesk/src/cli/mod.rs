//! Command-line interface for agentdesk.
//!
//! This module provides the CLI structure for the `agentdesk` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddClientCommand, ClientsCommand, ConfigCommand, NotesCommand, OutputFormat, ServeCommand,
    StatusCommand, UpdateClientCommand,
};

use crate::logging::Verbosity;

/// agentdesk - Keep your client book in one place
///
/// Serves the client API used by the agent dashboard and manages the same
/// client files from the command line.
#[derive(Debug, Parser)]
#[command(name = "agentdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Manage clients
    #[command(subcommand)]
    Clients(ClientsCommand),

    /// Read or write client notes
    #[command(subcommand)]
    Notes(NotesCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
