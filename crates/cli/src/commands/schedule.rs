//! Scheduling request submission

use anyhow::{Context, Result};
use colored::Colorize;

use crate::client::{ApiClient, ScheduleResultView};
use crate::output::{print_error, print_success, OutputFormat};

/// Submit a workload from a JSON spec file for placement
pub async fn submit(client: &ApiClient, file: &str, bind: bool, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read workload spec from {}", file))?;
    let workload: serde_json::Value =
        serde_json::from_str(&content).context("Invalid workload spec JSON")?;

    let request = serde_json::json!({ "workload": workload, "bind": bind });
    let result: ScheduleResultView = client.post("scheduling/requests", &request).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Table => {
            if let Some(node) = result.feasible.first() {
                let verb = if bind { "bound to" } else { "fits on" };
                print_success(&format!("Workload {} {} {}", result.workload, verb, node));
                if result.feasible.len() > 1 {
                    println!(
                        "  {} other feasible nodes: {}",
                        result.feasible.len() - 1,
                        result.feasible[1..].join(", ")
                    );
                }
            } else {
                print_error(&format!("Workload {} is unschedulable", result.workload));
                for (node, reasons) in &result.failures {
                    println!("  {}: {}", node.bold(), reasons.join("; "));
                }
                for (node, error) in &result.errors {
                    println!("  {}: {}", node.bold(), error.red());
                }
            }
        }
    }

    Ok(())
}
