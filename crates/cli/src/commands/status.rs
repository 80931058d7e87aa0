//! Service status reporting

use anyhow::Result;

use crate::client::{ApiClient, HealthView, NodeView, ReadinessView};
use crate::output::{color_status, OutputFormat};

/// Show scheduler service health and cluster summary
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthView = client.get("healthz").await?;
    let readiness: ReadinessView = client.get("readyz").await?;
    let nodes: Vec<NodeView> = client.get("nodes").await?;

    let pod_total: usize = nodes.iter().map(|n| n.pod_count).sum();

    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "status": health.status,
                "ready": readiness.ready,
                "components": health.components,
                "nodes": nodes.len(),
                "pods": pod_total,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => {
            println!("Status:  {}", color_status(&health.status));
            println!("Ready:   {}", readiness.ready);
            println!("Nodes:   {}", nodes.len());
            println!("Pods:    {}", pod_total);
            println!("\nComponents:");
            for (name, component) in &health.components {
                match &component.message {
                    Some(message) => println!(
                        "  {:<10} {} ({})",
                        name,
                        color_status(&component.status),
                        message
                    ),
                    None => println!("  {:<10} {}", name, color_status(&component.status)),
                }
            }
        }
    }

    Ok(())
}
