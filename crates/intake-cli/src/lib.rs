//! Intake CLI Library
//!
//! Admin command-line client for the intake server.
//!
//! # Overview
//!
//! - **Invitations**: issue a token and its questionnaire link (`intake invite`)
//! - **Overview**: list every record, most recently updated first (`intake list`)
//! - **Records**: show one record (`intake show`) or submit answers for it
//!   (`intake submit`)
//! - **Audit trail**: print a record's field-level history (`intake audit`)
//! - **Health**: check the server and its store (`intake health`)

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod commands;
pub mod error;

// Re-export commonly used types
pub use api::client::DEFAULT_SERVER_URL;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Intake - questionnaire administration
#[derive(Parser, Debug)]
#[command(name = "intake")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL
    #[arg(long, env = "INTAKE_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
    pub server_url: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue a new invitation and print its link
    Invite,

    /// List the overview of all records
    List,

    /// Show every answered field of a record
    Show {
        /// Record token
        token: String,
    },

    /// Submit answers for a record
    #[command(arg_required_else_help = true)]
    Submit {
        /// Record token
        token: String,

        /// Field to set, as NAME=VALUE (repeatable; an empty VALUE clears the field)
        #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = commands::submit::parse_field_assignment)]
        fields: Vec<(String, String)>,

        /// JSON file with an object of field values
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the audit log of a record, newest first
    Audit {
        /// Record token
        token: String,
    },

    /// Check server and store health
    Health,
}
