//! CLI module for the lynxgate quota gateway
//!
//! Provides subcommands:
//! - `serve`: HTTP API with the monthly quota reset scheduler

pub mod serve;

use clap::{Parser, Subcommand};

/// lynxgate - token-based quota authorization gateway
#[derive(Parser)]
#[command(name = "lynxgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API and the quota reset scheduler
    Serve,
}
