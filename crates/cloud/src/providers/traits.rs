//! Compute provider trait and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during compute provider operations.
#[derive(Error, Debug)]
pub enum ComputeProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The cloud-side operation completed with an error.
    #[error("Operation failed: {0}")]
    Operation(String),

    /// Instance has no externally reachable address yet.
    #[error("Address not assigned: {0}")]
    AddressUnavailable(String),
}

/// Request to launch a new GPU instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchInstanceRequest {
    /// Instance name; also the handle every later call uses.
    pub name: String,
    /// Zone to place the instance in (e.g. "us-central1-a").
    pub zone: String,
    /// Region the zone belongs to (e.g. "us-central1").
    pub region: String,
    /// Machine type (e.g. "n1-standard-4").
    pub machine_type: String,
    /// Source machine image to boot from.
    pub image: String,
    /// Boot disk size in GB.
    pub disk_gb: i64,
    /// Accelerator type (e.g. "nvidia-tesla-t4").
    pub gpu_type: String,
    /// Number of accelerators to attach.
    pub gpu_count: i64,
    /// Startup script run on first boot.
    pub startup_script: Option<String>,
}

/// Capability to create, inspect, and delete GPU compute instances.
///
/// Every method is a remote call that may take seconds to minutes; callers
/// are expected to bound them with their own timeout.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Create an instance and block until the cloud confirms it exists.
    async fn launch_instance(&self, req: LaunchInstanceRequest)
        -> Result<(), ComputeProviderError>;

    /// The instance's external IPv4 address.
    async fn instance_address(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<String, ComputeProviderError>;

    /// Delete an instance and block until the cloud confirms the deletion.
    async fn delete_instance(&self, zone: &str, name: &str) -> Result<(), ComputeProviderError>;
}
