//! Command-line interface for the `odyssey` binary.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Odyssey interactive story server.
#[derive(Debug, Parser)]
#[command(name = "odyssey")]
#[command(about = "Interactive story engine driven by language models")]
#[command(version)]
pub struct Cli {
    /// Configuration file layered over the defaults
    #[arg(short, long, global = true, env = "ODYSSEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to bind, overriding `server.bind`
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Apply pending database migrations
    Migrate,
}
