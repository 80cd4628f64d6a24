//! Domain types: rented resources, catalog entries, and ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a rented resource.
///
/// The happy path is `spinning → building → active`; teardown runs
/// `active → destroying → destroyed`. `failed` and `destroyed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Instance creation requested, not yet confirmed by the cloud.
    Spinning,
    /// Instance exists; boot and network setup still settling.
    Building,
    /// Instance is reachable and billable.
    Active,
    /// Instance deletion in progress.
    Destroying,
    /// Instance deleted.
    Destroyed,
    /// Provisioning or teardown failed.
    Failed,
}

impl ResourceStatus {
    /// Whether no further transition is permitted out of this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed | Self::Failed)
    }

    /// Whether `next` is an edge of the lifecycle graph.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Spinning, Self::Building)
                | (Self::Spinning | Self::Building | Self::Destroying, Self::Failed)
                | (Self::Building, Self::Active)
                | (Self::Active, Self::Destroying)
                | (Self::Destroying, Self::Destroyed)
        )
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spinning => write!(f, "spinning"),
            Self::Building => write!(f, "building"),
            Self::Active => write!(f, "active"),
            Self::Destroying => write!(f, "destroying"),
            Self::Destroyed => write!(f, "destroyed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A rented cloud compute instance tracked by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: Uuid,
    /// Owning account.
    pub owner: Uuid,
    /// Server configuration the price was fixed from.
    pub server_config: Uuid,
    /// Template the instance was booted from.
    pub template: Uuid,
    /// Cloud instance name, generated at request time.
    pub handle: String,
    /// Current lifecycle status.
    pub status: ResourceStatus,
    /// Assigned external address, once the instance is reachable.
    pub address: Option<String>,
    /// Boot disk size in GB.
    pub storage_gb: i64,
    /// Price per metering cycle, fixed at creation.
    pub price: f64,
    /// When the resource was requested.
    pub created_at: DateTime<Utc>,
}

/// Catalog entry describing a rentable machine shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique configuration identifier.
    pub id: Uuid,
    /// Region instances are placed in (e.g. "us-central1").
    pub region: String,
    /// Zone instances are placed in (e.g. "us-central1-a").
    pub zone: String,
    /// Accelerator type (e.g. "nvidia-tesla-t4").
    pub gpu_type: String,
    /// Number of accelerators.
    pub gpu_count: i64,
    /// Machine type (e.g. "n1-standard-4").
    pub machine_type: String,
    /// Price per metering cycle in USD.
    pub price: f64,
    /// Whether the configuration is currently offered.
    pub active: bool,
}

/// Catalog entry naming a bootable machine image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Unique template identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Description shown in the catalog.
    pub description: String,
    /// Source machine image the instance boots from.
    pub image: String,
    /// Minimum boot disk size the image requires, in GB.
    pub min_disk_gb: i64,
    /// Whether the template is currently offered.
    pub active: bool,
}

/// Kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Credit to the account.
    Deposit,
    /// Debit against the account.
    Charge,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Charge => write!(f, "charge"),
        }
    }
}

/// An immutable monetary event. Entries are append-only; the account balance
/// is always recomputed from the full set, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Account the entry applies to.
    pub owner: Uuid,
    /// Entry kind.
    pub kind: EntryKind,
    /// Amount in USD, always positive.
    pub amount: f64,
    /// Resource the entry relates to, if any.
    pub resource: Option<Uuid>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a charge against a resource.
    #[must_use]
    pub fn charge(owner: Uuid, amount: f64, resource: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind: EntryKind::Charge,
            amount,
            resource: Some(resource),
            created_at: Utc::now(),
        }
    }

    /// Create a plain deposit (e.g. recorded by the payment layer).
    #[must_use]
    pub fn deposit(owner: Uuid, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind: EntryKind::Deposit,
            amount,
            resource: None,
            created_at: Utc::now(),
        }
    }

    /// Create a compensating deposit for a resource whose provisioning failed.
    #[must_use]
    pub fn refund(owner: Uuid, amount: f64, resource: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind: EntryKind::Deposit,
            amount,
            resource: Some(resource),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_edges() {
        use ResourceStatus::{Active, Building, Destroyed, Destroying, Spinning};

        assert!(Spinning.can_transition_to(Building));
        assert!(Building.can_transition_to(Active));
        assert!(Active.can_transition_to(Destroying));
        assert!(Destroying.can_transition_to(Destroyed));
    }

    #[test]
    fn test_failure_edges() {
        use ResourceStatus::{Active, Building, Destroying, Failed, Spinning};

        assert!(Spinning.can_transition_to(Failed));
        assert!(Building.can_transition_to(Failed));
        assert!(Destroying.can_transition_to(Failed));
        assert!(!Active.can_transition_to(Failed));
    }

    #[test]
    fn test_terminal_states_have_no_edges() {
        use ResourceStatus::{Active, Building, Destroyed, Destroying, Failed, Spinning};

        for terminal in [Failed, Destroyed] {
            assert!(terminal.is_terminal());
            for next in [Spinning, Building, Active, Destroying, Destroyed, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_no_skipped_edges() {
        use ResourceStatus::{Active, Building, Destroying, Spinning};

        assert!(!Spinning.can_transition_to(Active));
        assert!(!Spinning.can_transition_to(Destroying));
        assert!(!Building.can_transition_to(Destroying));
        assert!(!Active.can_transition_to(Building));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ResourceStatus::Spinning.to_string(), "spinning");
        assert_eq!(ResourceStatus::Destroying.to_string(), "destroying");
    }

    #[test]
    fn test_refund_references_resource() {
        let owner = Uuid::new_v4();
        let resource = Uuid::new_v4();
        let entry = LedgerEntry::refund(owner, 30.0, resource);
        assert_eq!(entry.kind, EntryKind::Deposit);
        assert_eq!(entry.resource, Some(resource));
    }
}
