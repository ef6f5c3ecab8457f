//! # mcp-catalyst
//!
//! MCP (Model Context Protocol) server that exposes Cisco Catalyst Center
//! data as tools. Runs as a stdio JSON-RPC server — designed to be launched
//! by an AI agent host.
//!
//! ## Architecture
//!
//! ```text
//! main.rs       — entry point, config loading, logging, MCP server launch
//! config.rs     — JSON file / env-var configuration loading
//! client.rs     — HTTP client for Catalyst Center REST endpoints
//! normalize.rs  — JSON → string-or-null coercion, envelope unwrapping
//! records.rs    — flat records returned by the tools
//! directory.rs  — hostname → device id directory
//! drift.rs      — configuration snapshot diff
//! queries.rs    — query layer and error taxonomy
//! tools.rs      — tool definitions and handlers
//! mcp.rs        — MCP JSON-RPC protocol handler (stdio)
//! ```
//!
//! ## Tools
//!
//! `inventory`, `compliance_summary`, `client_health`, `sda_fabrics`,
//! `config_drift`

mod client;
mod config;
mod directory;
mod drift;
mod mcp;
mod normalize;
mod queries;
mod records;
mod tools;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use client::CatalystClient;
use config::Cli;
use queries::NetworkQueries;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match config::load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-catalyst: configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // stdout carries the protocol, so logs go to stderr
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let client = match CatalystClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            std::process::exit(1);
        }
    };

    info!(
        controller = client.base_url(),
        verify_tls = config.verify_tls,
        "mcp-catalyst starting"
    );

    mcp::run_stdio(NetworkQueries::new(client)).await;
}
