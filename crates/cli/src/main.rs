//! Pod Scheduler CLI
//!
//! A command-line tool for registering nodes, submitting scheduling
//! requests, and inspecting the pod scheduler service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{nodes, schedule, status};

/// Pod Scheduler CLI
#[derive(Parser)]
#[command(name = "psctl")]
#[command(author, version, about = "CLI for the Pod Scheduler", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via PSCTL_API_URL env var)
    #[arg(long, env = "PSCTL_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage tracked nodes
    #[command(subcommand)]
    Nodes(NodeCommands),

    /// Submit a workload for placement
    Schedule {
        /// Path to a workload spec JSON file
        #[arg(long, short)]
        file: String,

        /// Commit the workload to the first feasible node
        #[arg(long)]
        bind: bool,
    },

    /// Show scheduler service status
    Status,
}

#[derive(Subcommand)]
pub enum NodeCommands {
    /// List tracked nodes
    List,

    /// Register or replace a node from a JSON spec file
    Add {
        /// Path to a node spec JSON file
        #[arg(long, short)]
        file: String,
    },

    /// Remove a node
    Remove {
        /// Node name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Nodes(node_cmd) => match node_cmd {
            NodeCommands::List => {
                nodes::list_nodes(&client, cli.format).await?;
            }
            NodeCommands::Add { file } => {
                nodes::add_node(&client, &file, cli.format).await?;
            }
            NodeCommands::Remove { name } => {
                nodes::remove_node(&client, &name, cli.format).await?;
            }
        },
        Commands::Schedule { file, bind } => {
            schedule::submit(&client, &file, bind, cli.format).await?;
        }
        Commands::Status => {
            status::show_status(&client, cli.format).await?;
        }
    }

    Ok(())
}
