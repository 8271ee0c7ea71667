//! Futon CLI - Command-line client for the Futon daemon
//!
//! Triggers sweeps (e.g. from cron) and drives the item/order lifecycle.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "futon")]
#[command(about = "Futon drying-lifecycle CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "FUTON_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sweep now
    Sweep {
        #[command(subcommand)]
        sweep: SweepCommand,
    },

    /// Register a new item
    Register {
        /// Owner user ID
        #[arg(short, long)]
        owner: String,

        /// Current mite score (0-100)
        #[arg(short, long)]
        score: i64,
    },

    /// Commit a self-dry window for an item
    CommitWindow {
        /// Item ID
        item_id: String,

        /// Window start (epoch millis)
        #[arg(long)]
        start: i64,

        /// Window end (epoch millis)
        #[arg(long)]
        end: i64,

        /// Predicted mite score after the window
        #[arg(long)]
        predicted: Option<i64>,
    },

    /// Ask a helper to pick up an item
    RequestPickup {
        /// Item ID
        item_id: String,

        /// Predicted mite score after the service
        #[arg(long)]
        predicted: Option<i64>,
    },

    /// Accept a pending order as a helper
    Accept {
        /// Order ID
        order_id: String,

        /// Helper user ID
        #[arg(long)]
        helper: String,
    },

    /// Mark an accepted order as in progress
    Start {
        /// Order ID
        order_id: String,
    },

    /// Complete an order
    Complete {
        /// Order ID
        order_id: String,
    },

    /// Show system status
    Status,
}

#[derive(Subcommand)]
enum SweepCommand {
    /// Cancel pending orders past the pickup grace period
    PickupTimeout,
    /// Move items whose self-dry window has opened
    WindowStart,
    /// Return items whose self-dry window has closed
    WindowEnd,
    /// Complete every expired self-dry window (needs the API key)
    Reconcile {
        /// Shared secret configured on the daemon
        #[arg(long, env = "FUTON_RECONCILE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

impl SweepCommand {
    fn method(&self) -> &'static str {
        match self {
            SweepCommand::PickupTimeout => "sweep.pickup_timeout.v1",
            SweepCommand::WindowStart => "sweep.window_start.v1",
            SweepCommand::WindowEnd => "sweep.window_end.v1",
            SweepCommand::Reconcile { .. } => "sweep.reconcile.v1",
        }
    }

    fn params(&self) -> serde_json::Value {
        match self {
            SweepCommand::Reconcile { api_key } => json!({ "api_key": api_key }),
            _ => json!({}),
        }
    }
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SweepReport {
    sweep: String,
    success: bool,
    message: String,
    processed_count: usize,
    updated_count: usize,
    deleted_count: Option<usize>,
    mite_scores_updated: Option<usize>,
    notifications_sent: Option<usize>,
    #[serde(default)]
    errors: Vec<String>,
    error: Option<String>,
}

#[derive(Tabled)]
struct SweepRow {
    sweep: String,
    processed: usize,
    updated: usize,
    deleted: String,
    scores: String,
    notified: String,
}

impl From<&SweepReport> for SweepRow {
    fn from(report: &SweepReport) -> Self {
        let opt = |v: Option<usize>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
        Self {
            sweep: report.sweep.clone(),
            processed: report.processed_count,
            updated: report.updated_count,
            deleted: opt(report.deleted_count),
            scores: opt(report.mite_scores_updated),
            notified: opt(report.notifications_sent),
        }
    }
}

#[derive(Deserialize, Tabled)]
struct ItemResult {
    item_id: String,
    status: String,
}

#[derive(Deserialize, Tabled)]
struct WindowResult {
    item_id: String,
    history_id: String,
    status: String,
}

#[derive(Deserialize, Tabled)]
struct OrderResult {
    order_id: String,
    status: String,
}

#[derive(Deserialize, Tabled)]
struct CompletionResult {
    order_id: String,
    item_id: String,
    order_status: String,
    item_status: String,
    mite_score: u8,
    notified: bool,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_table<T: Tabled>(headline: &str, row: T) {
    println!("{}", headline.green().bold());
    println!();
    println!("{}", Table::new(vec![row]));
}

fn print_sweep(report: &SweepReport) -> Result<()> {
    if !report.success {
        println!("{}", format!("✗ {}", report.message).red().bold());
        if let Some(error) = &report.error {
            println!("  {} {}", "Error:".bold(), error);
        }
        anyhow::bail!("{} sweep failed", report.sweep);
    }

    println!("{}", format!("✓ {}", report.message).green().bold());
    println!();
    println!("{}", Table::new(vec![SweepRow::from(report)]));

    if !report.errors.is_empty() {
        println!();
        println!("{}", format!("{} item error(s):", report.errors.len()).yellow());
        for error in &report.errors {
            println!("  {} {}", "•".yellow(), error);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep { sweep } => {
            let result = call_rpc(&cli.rpc_url, sweep.method(), sweep.params()).await?;
            let report: SweepReport = serde_json::from_value(result)?;
            print_sweep(&report)?;
        }

        Commands::Register { owner, score } => {
            let params = json!({ "owner_id": owner, "mite_score": score });
            let result = call_rpc(&cli.rpc_url, "item.register.v1", params).await?;
            let item: ItemResult = serde_json::from_value(result)?;
            print_table("✓ Item registered", item);
        }

        Commands::CommitWindow {
            item_id,
            start,
            end,
            predicted,
        } => {
            let params = json!({
                "item_id": item_id,
                "start_time": start,
                "end_time": end,
                "predicted_score": predicted,
            });
            let result = call_rpc(&cli.rpc_url, "item.commit_window.v1", params).await?;
            let window: WindowResult = serde_json::from_value(result)?;
            print_table("✓ Self-dry window committed", window);
        }

        Commands::RequestPickup { item_id, predicted } => {
            let params = json!({ "item_id": item_id, "predicted_score": predicted });
            let result = call_rpc(&cli.rpc_url, "order.request.v1", params).await?;
            let order: OrderResult = serde_json::from_value(result)?;
            print_table("✓ Pickup requested", order);
        }

        Commands::Accept { order_id, helper } => {
            let params = json!({ "order_id": order_id, "service_user_id": helper });
            let result = call_rpc(&cli.rpc_url, "order.accept.v1", params).await?;
            let order: OrderResult = serde_json::from_value(result)?;
            print_table("✓ Order accepted", order);
        }

        Commands::Start { order_id } => {
            let params = json!({ "order_id": order_id });
            let result = call_rpc(&cli.rpc_url, "order.start.v1", params).await?;
            let order: OrderResult = serde_json::from_value(result)?;
            print_table("✓ Order started", order);
        }

        Commands::Complete { order_id } => {
            let params = json!({ "order_id": order_id });
            let result = call_rpc(&cli.rpc_url, "order.complete.v1", params).await?;
            let done: CompletionResult = serde_json::from_value(result)?;
            print_table("✓ Order completed", done);
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), stats["version"]);
                    println!();
                    println!("  {} {}", "Normal:".bold(), stats["normal_items"]);
                    println!(
                        "  {} {}",
                        "Waiting window:".bold(),
                        stats["waiting_optimal_time_items"]
                    );
                    println!("  {} {}", "Self-drying:".bold(), stats["self_drying_items"]);
                    println!(
                        "  {} {}",
                        "Waiting pickup:".bold(),
                        stats["waiting_pickup_items"]
                    );
                    println!("  {} {}", "Active orders:".bold(), stats["active_orders"]);
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
