//! Thread-safe in-memory implementation of [`LedgerStore`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{EntryKind, LedgerEntry, Resource, ResourceStatus, ServerConfig, Template};
use crate::store::{LedgerStore, StoreError};

#[derive(Default)]
struct Inner {
    resources: HashMap<Uuid, Resource>,
    entries: Vec<LedgerEntry>,
    server_configs: HashMap<Uuid, ServerConfig>,
    templates: HashMap<Uuid, Template>,
}

/// In-memory [`LedgerStore`] used by tests and single-process deployments.
///
/// Cloning is cheap and clones share the same underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a server configuration into the catalog.
    pub fn add_server_config(&self, config: ServerConfig) {
        if let Ok(mut inner) = self.inner.write() {
            inner.server_configs.insert(config.id, config);
        }
    }

    /// Seed a template into the catalog.
    pub fn add_template(&self, template: Template) {
        if let Ok(mut inner) = self.inner.write() {
            inner.templates.insert(template.id, template);
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_resource(&self, resource: Resource) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.resources.insert(resource.id, resource);
        Ok(())
    }

    async fn update_resource_status(
        &self,
        id: Uuid,
        status: ResourceStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let resource = inner
            .resources
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("resource {id}")))?;

        if !resource.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: resource.status,
                to: status,
            });
        }

        resource.status = status;
        Ok(())
    }

    async fn set_resource_address(&self, id: Uuid, address: &str) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let resource = inner
            .resources
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("resource {id}")))?;
        resource.address = Some(address.to_string());
        Ok(())
    }

    async fn resource(&self, id: Uuid) -> Result<Resource, StoreError> {
        self.read()?
            .resources
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("resource {id}")))
    }

    async fn resource_by_handle(&self, handle: &str) -> Result<Resource, StoreError> {
        self.read()?
            .resources
            .values()
            .find(|r| r.handle == handle)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("resource with handle {handle}")))
    }

    async fn resources_by_status(
        &self,
        status: ResourceStatus,
    ) -> Result<Vec<Resource>, StoreError> {
        Ok(self
            .read()?
            .resources
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn resources_by_owner(&self, owner: Uuid) -> Result<Vec<Resource>, StoreError> {
        let mut resources: Vec<Resource> = self
            .read()?
            .resources
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resources)
    }

    async fn insert_entry(&self, entry: LedgerEntry) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.entries.push(entry);
        Ok(())
    }

    async fn entries_by_owner(
        &self,
        owner: Uuid,
        kind: Option<EntryKind>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .read()?
            .entries
            .iter()
            .filter(|e| e.owner == owner && kind.is_none_or(|k| e.kind == k))
            .cloned()
            .collect())
    }

    async fn sum_entries(&self, owner: Uuid, kind: EntryKind) -> Result<f64, StoreError> {
        Ok(self
            .read()?
            .entries
            .iter()
            .filter(|e| e.owner == owner && e.kind == kind)
            .map(|e| e.amount)
            .sum())
    }

    async fn server_config(&self, id: Uuid) -> Result<ServerConfig, StoreError> {
        self.read()?
            .server_configs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("server config {id}")))
    }

    async fn template(&self, id: Uuid) -> Result<Template, StoreError> {
        self.read()?
            .templates
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("template {id}")))
    }

    async fn list_server_configs(&self) -> Result<Vec<ServerConfig>, StoreError> {
        let mut configs: Vec<ServerConfig> =
            self.read()?.server_configs.values().cloned().collect();
        configs.sort_by(|a, b| b.active.cmp(&a.active).then(a.price.total_cmp(&b.price)));
        Ok(configs)
    }

    async fn list_templates(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates: Vec<Template> = self.read()?.templates.values().cloned().collect();
        templates.sort_by(|a, b| b.active.cmp(&a.active).then(a.name.cmp(&b.name)));
        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(owner: Uuid, handle: &str, status: ResourceStatus) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            owner,
            server_config: Uuid::new_v4(),
            template: Uuid::new_v4(),
            handle: handle.to_string(),
            status,
            address: None,
            storage_gb: 100,
            price: 30.0,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_handle() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let r = resource(owner, "rig-abc123", ResourceStatus::Spinning);
        store.insert_resource(r.clone()).await.unwrap();

        let found = store.resource_by_handle("rig-abc123").await.unwrap();
        assert_eq!(found.id, r.id);

        let missing = store.resource_by_handle("rig-missing").await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_status_updates_follow_graph() {
        let store = MemoryStore::new();
        let r = resource(Uuid::new_v4(), "rig-a", ResourceStatus::Spinning);
        store.insert_resource(r.clone()).await.unwrap();

        store
            .update_resource_status(r.id, ResourceStatus::Building)
            .await
            .unwrap();
        store
            .update_resource_status(r.id, ResourceStatus::Active)
            .await
            .unwrap();

        let err = store
            .update_resource_status(r.id, ResourceStatus::Building)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_no_transition_out_of_terminal() {
        let store = MemoryStore::new();
        let r = resource(Uuid::new_v4(), "rig-b", ResourceStatus::Spinning);
        store.insert_resource(r.clone()).await.unwrap();
        store
            .update_resource_status(r.id, ResourceStatus::Failed)
            .await
            .unwrap();

        for next in [
            ResourceStatus::Spinning,
            ResourceStatus::Building,
            ResourceStatus::Active,
            ResourceStatus::Destroying,
        ] {
            let err = store.update_resource_status(r.id, next).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidTransition { .. }));
        }
    }

    #[tokio::test]
    async fn test_sum_entries_empty_is_zero() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let sum = store.sum_entries(owner, EntryKind::Deposit).await.unwrap();
        assert!((sum - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_sum_entries_filters_owner_and_kind() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let rid = Uuid::new_v4();

        store
            .insert_entry(LedgerEntry::deposit(owner, 100.0))
            .await
            .unwrap();
        store
            .insert_entry(LedgerEntry::charge(owner, 30.0, rid))
            .await
            .unwrap();
        store
            .insert_entry(LedgerEntry::deposit(other, 500.0))
            .await
            .unwrap();

        let deposits = store.sum_entries(owner, EntryKind::Deposit).await.unwrap();
        let charges = store.sum_entries(owner, EntryKind::Charge).await.unwrap();
        assert!((deposits - 100.0).abs() < f64::EPSILON);
        assert!((charges - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_resources_by_status() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store
            .insert_resource(resource(owner, "rig-1", ResourceStatus::Active))
            .await
            .unwrap();
        store
            .insert_resource(resource(owner, "rig-2", ResourceStatus::Failed))
            .await
            .unwrap();

        let active = store
            .resources_by_status(ResourceStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].handle, "rig-1");
    }

    #[tokio::test]
    async fn test_catalog_lists_active_first() {
        let store = MemoryStore::new();
        let mut retired = Template {
            id: Uuid::new_v4(),
            name: "a-retired".to_string(),
            description: String::new(),
            image: "projects/rig/global/machineImages/old".to_string(),
            min_disk_gb: 50,
            active: false,
        };
        store.add_template(retired.clone());
        retired.id = Uuid::new_v4();
        retired.name = "z-current".to_string();
        retired.active = true;
        store.add_template(retired);

        let templates = store.list_templates().await.unwrap();
        assert_eq!(templates[0].name, "z-current");
        assert!(templates[0].active);
    }

    #[tokio::test]
    async fn test_server_config_catalog_orders_active_then_price() {
        let store = MemoryStore::new();
        let base = ServerConfig {
            id: Uuid::new_v4(),
            region: "us-central1".to_string(),
            zone: "us-central1-a".to_string(),
            gpu_type: "nvidia-tesla-t4".to_string(),
            gpu_count: 1,
            machine_type: "n1-standard-4".to_string(),
            price: 30.0,
            active: true,
        };

        let mut pricey = base.clone();
        pricey.id = Uuid::new_v4();
        pricey.price = 95.0;
        let mut retired = base.clone();
        retired.id = Uuid::new_v4();
        retired.price = 5.0;
        retired.active = false;

        store.add_server_config(pricey);
        store.add_server_config(retired);
        store.add_server_config(base.clone());

        let configs = store.list_server_configs().await.unwrap();
        assert_eq!(configs.len(), 3);
        assert_eq!(configs[0].id, base.id);
        assert!(!configs[2].active);
    }
}
