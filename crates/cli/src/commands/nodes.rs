//! Node-related CLI commands

use anyhow::{Context, Result};
use tabled::Tabled;

use crate::client::{ApiClient, NodeView};
use crate::output::{format_bytes, format_cpu, print_success, print_warning, OutputFormat};

/// Row for the nodes table
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "CPU Used")]
    cpu_used: String,
    #[tabled(rename = "CPU Alloc")]
    cpu_alloc: String,
    #[tabled(rename = "Mem Used")]
    memory_used: String,
    #[tabled(rename = "Mem Alloc")]
    memory_alloc: String,
    #[tabled(rename = "Pods")]
    pods: String,
}

/// List tracked nodes with their committed and allocatable capacity
pub async fn list_nodes(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let nodes: Vec<NodeView> = client.get("nodes").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&nodes)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if nodes.is_empty() {
                print_warning("No nodes found");
                return Ok(());
            }

            let rows: Vec<NodeRow> = nodes
                .iter()
                .map(|n| NodeRow {
                    name: n.node_name.clone(),
                    cpu_used: format_cpu(n.requested.milli_cpu),
                    cpu_alloc: format_cpu(n.allocatable.milli_cpu),
                    memory_used: format_bytes(n.requested.memory),
                    memory_alloc: format_bytes(n.allocatable.memory),
                    pods: format!("{}/{}", n.pod_count, n.allowed_pods),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} nodes", nodes.len());
        }
    }

    Ok(())
}

/// Register or replace a node from a JSON spec file
pub async fn add_node(client: &ApiClient, file: &str, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read node spec from {}", file))?;
    let node: serde_json::Value =
        serde_json::from_str(&content).context("Invalid node spec JSON")?;

    let name = node["name"]
        .as_str()
        .context("Node spec is missing a \"name\" field")?
        .to_string();

    let response: serde_json::Value = client.put(&format!("nodes/{}", name), &node).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Table => print_success(&format!("Node {} registered", name)),
    }

    Ok(())
}

/// Remove a node from the cluster cache
pub async fn remove_node(client: &ApiClient, name: &str, format: OutputFormat) -> Result<()> {
    let response: serde_json::Value = client.delete(&format!("nodes/{}", name)).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Table => print_success(&format!("Node {} removed", name)),
    }

    Ok(())
}
