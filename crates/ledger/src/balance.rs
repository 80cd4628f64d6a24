//! Read-side projections over the ledger.
//!
//! Balances are never stored. Every read recomputes from the full entry set,
//! so the projection cannot drift from the ledger at the cost of an
//! aggregation per call.

use uuid::Uuid;

use crate::models::{EntryKind, ResourceStatus};
use crate::store::{LedgerStore, StoreError};

/// Current balance for an owner: deposits minus charges.
///
/// Owners with no entries on either side have a balance of `0.0`.
///
/// # Errors
/// Returns an error if either aggregate query fails.
pub async fn balance(store: &dyn LedgerStore, owner: Uuid) -> Result<f64, StoreError> {
    let deposits = store.sum_entries(owner, EntryKind::Deposit).await?;
    let charges = store.sum_entries(owner, EntryKind::Charge).await?;
    Ok(deposits - charges)
}

/// Aggregate view of an owner's running resources, for the account dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUsage {
    /// Number of resources currently active.
    pub active_resources: usize,
    /// Summed per-cycle price of the active resources.
    pub cost_per_cycle: f64,
    /// Summed boot disk size of the active resources, in GB.
    pub storage_gb: i64,
    /// Current balance.
    pub balance: f64,
}

/// Compute the usage summary for an owner.
///
/// Only resources in status `active` count toward the totals; everything
/// else has either stopped billing or never started.
///
/// # Errors
/// Returns an error if the resource or aggregate queries fail.
pub async fn usage(store: &dyn LedgerStore, owner: Uuid) -> Result<AccountUsage, StoreError> {
    let resources = store.resources_by_owner(owner).await?;
    let active = resources
        .iter()
        .filter(|r| r.status == ResourceStatus::Active);

    let mut count = 0;
    let mut cost = 0.0;
    let mut storage = 0;
    for resource in active {
        count += 1;
        cost += resource.price;
        storage += resource.storage_gb;
    }

    Ok(AccountUsage {
        active_resources: count,
        cost_per_cycle: cost,
        storage_gb: storage,
        balance: balance(store, owner).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{LedgerEntry, Resource};

    fn active_resource(owner: Uuid, price: f64, storage_gb: i64) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            owner,
            server_config: Uuid::new_v4(),
            template: Uuid::new_v4(),
            handle: format!("rig-{}", Uuid::new_v4().simple()),
            status: ResourceStatus::Active,
            address: Some("203.0.113.9".to_string()),
            storage_gb,
            price,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_balance_with_no_entries_is_zero() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let b = balance(&store, owner).await.unwrap();
        assert!((b - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_balance_is_deposits_minus_charges() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let rid = Uuid::new_v4();

        store
            .insert_entry(LedgerEntry::deposit(owner, 100.0))
            .await
            .unwrap();
        assert!((balance(&store, owner).await.unwrap() - 100.0).abs() < f64::EPSILON);

        store
            .insert_entry(LedgerEntry::charge(owner, 30.0, rid))
            .await
            .unwrap();
        assert!((balance(&store, owner).await.unwrap() - 70.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_balance_recomputation_is_idempotent() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store
            .insert_entry(LedgerEntry::deposit(owner, 42.5))
            .await
            .unwrap();

        let first = balance(&store, owner).await.unwrap();
        let second = balance(&store, owner).await.unwrap();
        assert!((first - second).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_usage_counts_only_active_resources() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        store
            .insert_resource(active_resource(owner, 30.0, 100))
            .await
            .unwrap();
        store
            .insert_resource(active_resource(owner, 12.5, 250))
            .await
            .unwrap();

        let mut failed = active_resource(owner, 99.0, 500);
        failed.status = ResourceStatus::Failed;
        store.insert_resource(failed).await.unwrap();

        let usage = usage(&store, owner).await.unwrap();
        assert_eq!(usage.active_resources, 2);
        assert!((usage.cost_per_cycle - 42.5).abs() < f64::EPSILON);
        assert_eq!(usage.storage_gb, 350);
    }
}
