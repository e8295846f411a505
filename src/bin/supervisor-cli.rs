use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "supervisor-cli")]
#[command(about = "Query the status listener of a running supervisor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:10010")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the aggregated health snapshot (exits 1 when unhealthy)
    Health,
    /// Dump Prometheus metrics
    Metrics,
    /// Show the effective configuration (non-prod only)
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            // 503 still carries the snapshot.
            let healthy = res.status().is_success();
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            if !healthy {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Metrics => {
            let res = client.get(format!("{}/metrics", base)).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: status listener returned {}", status);
                eprintln!("Response: {}", text);
                return Ok(ExitCode::FAILURE);
            }
            print!("{}", text);
        }
        Commands::Config => {
            let res = client.get(format!("{}/debug/config", base)).send().await?;
            return print_response(res).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: status listener returned {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}
