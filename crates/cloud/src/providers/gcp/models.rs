//! Compute Engine API request and response models.

use serde::{Deserialize, Serialize};

// ============================================================================
// Instance creation types
// ============================================================================

/// Instance insert request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertInstanceRequest {
    /// Instance name.
    pub name: String,
    /// Machine type (zone-relative URL).
    pub machine_type: String,
    /// Scheduling policy.
    pub scheduling: Scheduling,
    /// Attached disks.
    pub disks: Vec<AttachedDiskDefinition>,
    /// Network interfaces.
    pub network_interfaces: Vec<NetworkInterfaceDefinition>,
    /// Metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Guest accelerators.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guest_accelerators: Vec<AcceleratorConfig>,
    /// Source machine image to boot from.
    pub source_machine_image: String,
}

/// Scheduling policy. GPU instances cannot live-migrate, so maintenance
/// terminates them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    /// Restart automatically after a crash.
    pub automatic_restart: bool,
    /// Behavior during host maintenance ("TERMINATE" for GPU instances).
    pub on_host_maintenance: String,
    /// Provisioning model ("STANDARD").
    pub provisioning_model: String,
}

/// Attached disk definition for creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDiskDefinition {
    /// Boot disk.
    pub boot: bool,
    /// Auto delete with the instance.
    pub auto_delete: bool,
    /// Disk kind ("PERSISTENT").
    #[serde(rename = "type")]
    pub disk_type: String,
    /// Initialize params.
    pub initialize_params: InitializeParams,
}

/// Disk initialization parameters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Disk size in GB (the API wants a string).
    pub disk_size_gb: String,
}

/// Network interface definition for creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceDefinition {
    /// IP stack ("IPV4_ONLY").
    pub stack_type: String,
    /// Subnetwork (region-relative URL).
    pub subnetwork: String,
    /// Access configs (for the external IP).
    pub access_configs: Vec<AccessConfigDefinition>,
}

/// Access config definition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfigDefinition {
    /// Name.
    pub name: String,
    /// Network tier ("PREMIUM").
    pub network_tier: String,
}

/// Metadata for instance.
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// Metadata items.
    pub items: Vec<MetadataItem>,
}

/// Metadata item.
#[derive(Debug, Serialize)]
pub struct MetadataItem {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Guest accelerator attachment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorConfig {
    /// Number of accelerators.
    pub accelerator_count: i64,
    /// Accelerator type (zone-relative URL).
    pub accelerator_type: String,
}

// ============================================================================
// Instance read types
// ============================================================================

/// Compute Engine instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceInstance {
    /// Instance ID.
    pub id: String,
    /// Instance name.
    pub name: String,
    /// Status.
    pub status: String,
    /// Network interfaces.
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

/// Network interface.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// Network IP (internal).
    pub network_i_p: Option<String>,
    /// Access configs (for external IP).
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

/// Access configuration (external IP).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    /// External NAT IP.
    pub nat_i_p: Option<String>,
    /// Name.
    pub name: Option<String>,
}

// ============================================================================
// Operation types
// ============================================================================

/// Compute Engine zone operation (async task).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name.
    pub name: String,
    /// Status ("PENDING", "RUNNING", "DONE").
    pub status: String,
    /// Target link.
    pub target_link: Option<String>,
    /// Error, present once the operation is DONE and failed.
    pub error: Option<OperationError>,
}

/// Operation error.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    /// Errors.
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

/// Operation error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationErrorDetail {
    /// Error code.
    pub code: Option<String>,
    /// Error message.
    pub message: Option<String>,
}
