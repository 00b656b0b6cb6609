//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides configuration)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Client management commands.
#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    /// List all clients
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one client
    Show {
        /// Client id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a client
    Add(AddClientCommand),

    /// Change fields of an existing client
    Update(UpdateClientCommand),

    /// Find clients by mobile number
    Find {
        /// Mobile number to look for
        mobile: String,
    },
}

/// Arguments for `clients add`.
#[derive(Debug, Args)]
pub struct AddClientCommand {
    /// Client name
    #[arg(short, long)]
    pub name: String,

    /// Ten-digit mobile number
    #[arg(short, long)]
    pub mobile: String,

    /// Age in years
    #[arg(short, long)]
    pub age: Option<u32>,

    /// Additional field as TITLE=DESCRIPTION (repeatable)
    #[arg(short, long = "field", value_name = "TITLE=DESCRIPTION", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Document name (repeatable)
    #[arg(short, long = "document", value_name = "NAME")]
    pub documents: Vec<String>,
}

/// Arguments for `clients update`.
#[derive(Debug, Args)]
pub struct UpdateClientCommand {
    /// Client id
    pub id: String,

    /// New name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New ten-digit mobile number
    #[arg(short, long)]
    pub mobile: Option<String>,

    /// New age
    #[arg(short, long)]
    pub age: Option<u32>,

    /// Additional field to append as TITLE=DESCRIPTION (repeatable)
    #[arg(short, long = "field", value_name = "TITLE=DESCRIPTION", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Document name to append (repeatable)
    #[arg(short, long = "document", value_name = "NAME")]
    pub documents: Vec<String>,
}

/// Notes commands.
#[derive(Debug, Subcommand)]
pub enum NotesCommand {
    /// Print the notes for a client
    Show {
        /// Client id
        id: String,
    },

    /// Replace the notes for a client
    Set {
        /// Client id
        id: String,

        /// New notes text
        text: String,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One client per line
    Plain,
    /// Aligned columns with a header
    #[default]
    Table,
    /// JSON array
    Json,
}

/// Parse `TITLE=DESCRIPTION`. The description may be empty.
fn parse_field(s: &str) -> Result<(String, String), String> {
    let (title, description) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TITLE=DESCRIPTION, got {s:?}"))?;
    let title = title.trim();
    if title.is_empty() {
        return Err("field title cannot be empty".to_string());
    }
    Ok((title.to_string(), description.trim().to_string()))
}
