//! GCE operator CLI - manage Rig instances directly on Compute Engine.
//!
//! Meant for operators debugging the fleet, not for customers; the platform
//! itself drives the same calls through the orchestrator.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rig_cloud::{ComputeProvider, Gce, LaunchInstanceRequest};

/// GCE CLI - launch, inspect, and delete Rig GPU instances.
#[derive(Parser)]
#[command(name = "gce")]
#[command(about = "Manage Rig GPU instances on Compute Engine")]
struct Cli {
    /// GCP project ID (or set `GCP_PROJECT_ID` env var).
    #[arg(long, env = "GCP_PROJECT_ID")]
    project_id: String,

    /// OAuth2 access token (or set `GCP_ACCESS_TOKEN` env var).
    #[arg(long, env = "GCP_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch a new GPU instance.
    Launch {
        /// Instance name.
        #[arg(long)]
        name: String,

        /// Zone (e.g. us-central1-a).
        #[arg(long)]
        zone: String,

        /// Region (e.g. us-central1).
        #[arg(long)]
        region: String,

        /// Machine type (e.g. n1-standard-4).
        #[arg(long)]
        machine_type: String,

        /// Source machine image.
        #[arg(long)]
        image: String,

        /// Boot disk size in GB.
        #[arg(long, default_value = "100")]
        disk: i64,

        /// Accelerator type (e.g. nvidia-tesla-t4).
        #[arg(long)]
        gpu_type: String,

        /// Number of accelerators.
        #[arg(long, default_value = "1")]
        gpu_count: i64,
    },

    /// Print the external address of an instance.
    Address {
        /// Zone the instance lives in.
        #[arg(long)]
        zone: String,

        /// Instance name.
        #[arg(long)]
        name: String,
    },

    /// Delete an instance.
    Delete {
        /// Zone the instance lives in.
        #[arg(long)]
        zone: String,

        /// Instance name.
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let provider = Gce::new(&cli.project_id, &cli.access_token)
        .context("Failed to create Compute Engine client")?;

    match cli.command {
        Commands::Launch {
            name,
            zone,
            region,
            machine_type,
            image,
            disk,
            gpu_type,
            gpu_count,
        } => {
            info!(name = %name, zone = %zone, "Launching instance");

            provider
                .launch_instance(LaunchInstanceRequest {
                    name: name.clone(),
                    zone: zone.clone(),
                    region,
                    machine_type,
                    image,
                    disk_gb: disk,
                    gpu_type,
                    gpu_count,
                    startup_script: None,
                })
                .await?;

            match provider.instance_address(&zone, &name).await {
                Ok(address) => println!("{name} launched, external address {address}"),
                Err(e) => println!("{name} launched, no external address yet ({e})"),
            }
        }

        Commands::Address { zone, name } => {
            let address = provider.instance_address(&zone, &name).await?;
            println!("{address}");
        }

        Commands::Delete { zone, name } => {
            provider.delete_instance(&zone, &name).await?;
            println!("{name} deleted");
        }
    }

    Ok(())
}
