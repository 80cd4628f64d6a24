//! Provisioning orchestrator: drives each resource from request to a
//! terminal state.
//!
//! The synchronous surface (`request_provision`, `request_teardown`)
//! validates input, fixes the price, and persists the initial rows; the slow
//! cloud work runs in one spawned lifecycle task per resource. Tasks are
//! kept in a registry keyed by resource id so a teardown for a resource that
//! is still provisioning waits for the in-flight task instead of racing it —
//! per resource there is always exactly one writer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use rig_cloud::{ComputeProvider, LaunchInstanceRequest};
use rig_ledger::{LedgerEntry, LedgerStore, Resource, ResourceStatus, StoreError};

use crate::error::OrchestratorError;

/// Tuning knobs for the lifecycle tasks.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause between the instance becoming reachable and billing starting.
    pub settle_delay: Duration,
    /// Upper bound on every call into the compute provider.
    pub remote_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(10),
            remote_timeout: Duration::from_secs(300),
        }
    }
}

/// Drives resource lifecycles against a compute provider and a ledger store.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn LedgerStore>,
    provider: Arc<dyn ComputeProvider>,
    config: OrchestratorConfig,
    tasks: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl Orchestrator {
    /// Create an orchestrator over the given capabilities.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        provider: Arc<dyn ComputeProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Request a new resource.
    ///
    /// Validates the requested storage against the template minimum,
    /// resolves both catalog references, inserts the resource in `spinning`
    /// together with the initial charge, and spawns the provisioning task.
    /// Returns as soon as the rows are persisted; the caller observes
    /// progress by polling the resource status.
    ///
    /// # Errors
    /// `Validation` for insufficient storage, `NotFound` for an unknown
    /// catalog reference, `Store` if the synchronous inserts fail.
    pub async fn request_provision(
        &self,
        owner: Uuid,
        server_config_id: Uuid,
        template_id: Uuid,
        storage_gb: i64,
    ) -> Result<Resource, OrchestratorError> {
        let template = self.store.template(template_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => {
                OrchestratorError::NotFound(format!("template {template_id}"))
            }
            other => OrchestratorError::Store(other),
        })?;

        if storage_gb < template.min_disk_gb {
            return Err(OrchestratorError::Validation(format!(
                "template {} requires at least {} GB of storage, got {storage_gb}",
                template.name, template.min_disk_gb
            )));
        }

        let server_config = self
            .store
            .server_config(server_config_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => {
                    OrchestratorError::NotFound(format!("server config {server_config_id}"))
                }
                other => OrchestratorError::Store(other),
            })?;

        let resource = Resource {
            id: Uuid::new_v4(),
            owner,
            server_config: server_config.id,
            template: template.id,
            handle: generate_handle(),
            status: ResourceStatus::Spinning,
            address: None,
            storage_gb,
            price: server_config.price,
            created_at: Utc::now(),
        };

        self.store.insert_resource(resource.clone()).await?;
        self.store
            .insert_entry(LedgerEntry::charge(owner, resource.price, resource.id))
            .await?;

        info!(
            resource_id = %resource.id,
            handle = %resource.handle,
            price = resource.price,
            "provisioning requested"
        );

        let req = LaunchInstanceRequest {
            name: resource.handle.clone(),
            zone: server_config.zone.clone(),
            region: server_config.region.clone(),
            machine_type: server_config.machine_type.clone(),
            image: template.image.clone(),
            disk_gb: storage_gb,
            gpu_type: server_config.gpu_type.clone(),
            gpu_count: server_config.gpu_count,
            startup_script: None,
        };

        let task = tokio::spawn(run_provision(
            Arc::clone(&self.store),
            Arc::clone(&self.provider),
            resource.clone(),
            req,
            self.config.clone(),
        ));
        self.tasks.lock().await.insert(resource.id, task);

        Ok(resource)
    }

    /// Request teardown of a resource by its instance handle.
    ///
    /// The spawned teardown task first waits for any in-flight provisioning
    /// task for the same resource, then transitions it through `destroying`
    /// to `destroyed` (or `failed` if the deletion fails).
    ///
    /// # Errors
    /// `NotFound` for an unknown handle, `Validation` if the resource is
    /// already terminal or already being destroyed.
    pub async fn request_teardown(&self, handle: &str) -> Result<(), OrchestratorError> {
        let resource = self
            .store
            .resource_by_handle(handle)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => {
                    OrchestratorError::NotFound(format!("resource with handle {handle}"))
                }
                other => OrchestratorError::Store(other),
            })?;

        if resource.status.is_terminal() {
            return Err(OrchestratorError::Validation(format!(
                "resource {handle} is already {}",
                resource.status
            )));
        }
        if resource.status == ResourceStatus::Destroying {
            return Err(OrchestratorError::Validation(format!(
                "resource {handle} is already being destroyed"
            )));
        }

        let server_config = self.store.server_config(resource.server_config).await?;

        // Detach any in-flight provisioning task before spawning, so the
        // registry never holds a handle the teardown task is not aware of.
        let pending = self.tasks.lock().await.remove(&resource.id);

        info!(resource_id = %resource.id, handle = %handle, "teardown requested");

        let task = tokio::spawn(run_teardown(
            Arc::clone(&self.store),
            Arc::clone(&self.provider),
            resource.id,
            server_config.zone,
            pending,
            self.config.clone(),
        ));
        self.tasks.lock().await.insert(resource.id, task);

        Ok(())
    }

    /// Wait for the registered lifecycle task of a resource to finish.
    ///
    /// Returns immediately when no task is registered. Status polls stay the
    /// normal way to observe progress; this exists for callers that need a
    /// settled state, such as tests and drain-on-shutdown.
    pub async fn wait_for(&self, resource_id: Uuid) {
        let task = self.tasks.lock().await.remove(&resource_id);
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(resource_id = %resource_id, error = %e, "lifecycle task panicked");
            }
        }
    }
}

/// Generate a cloud instance handle. Compute Engine names must be RFC 1035
/// labels, so: lowercase, short, starts with a letter.
fn generate_handle() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("rig-{}", &id[..10])
}

async fn run_provision(
    store: Arc<dyn LedgerStore>,
    provider: Arc<dyn ComputeProvider>,
    resource: Resource,
    req: LaunchInstanceRequest,
    config: OrchestratorConfig,
) {
    let zone = req.zone.clone();

    match timeout(config.remote_timeout, provider.launch_instance(req)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(resource_id = %resource.id, error = %e, "instance creation failed");
            fail_and_refund(&store, &resource).await;
            return;
        }
        Err(_) => {
            warn!(
                resource_id = %resource.id,
                timeout_secs = config.remote_timeout.as_secs(),
                "instance creation timed out"
            );
            fail_and_refund(&store, &resource).await;
            return;
        }
    }

    if let Err(e) = store
        .update_resource_status(resource.id, ResourceStatus::Building)
        .await
    {
        error!(
            resource_id = %resource.id,
            error = %e,
            "status write failed after instance creation, abandoning task"
        );
        return;
    }

    match timeout(
        config.remote_timeout,
        provider.instance_address(&zone, &resource.handle),
    )
    .await
    {
        Ok(Ok(address)) => {
            if let Err(e) = store.set_resource_address(resource.id, &address).await {
                error!(
                    resource_id = %resource.id,
                    error = %e,
                    "address write failed, abandoning task"
                );
                return;
            }
        }
        // Not fatal: the address stays empty and can be observed (or
        // refreshed) through a later status poll.
        Ok(Err(e)) => {
            warn!(resource_id = %resource.id, error = %e, "address fetch failed, leaving address unset");
        }
        Err(_) => {
            warn!(resource_id = %resource.id, "address fetch timed out, leaving address unset");
        }
    }

    tokio::time::sleep(config.settle_delay).await;

    match store
        .update_resource_status(resource.id, ResourceStatus::Active)
        .await
    {
        Ok(()) => info!(resource_id = %resource.id, handle = %resource.handle, "resource active"),
        Err(e) => {
            error!(resource_id = %resource.id, error = %e, "active-status write failed, abandoning task");
        }
    }
}

/// Mark a resource failed and compensate the initial charge.
async fn fail_and_refund(store: &Arc<dyn LedgerStore>, resource: &Resource) {
    if let Err(e) = store
        .update_resource_status(resource.id, ResourceStatus::Failed)
        .await
    {
        error!(resource_id = %resource.id, error = %e, "failed-status write failed");
    }

    match store
        .insert_entry(LedgerEntry::refund(
            resource.owner,
            resource.price,
            resource.id,
        ))
        .await
    {
        Ok(()) => {
            info!(resource_id = %resource.id, amount = resource.price, "initial charge refunded");
        }
        Err(e) => error!(resource_id = %resource.id, error = %e, "refund write failed"),
    }
}

async fn run_teardown(
    store: Arc<dyn LedgerStore>,
    provider: Arc<dyn ComputeProvider>,
    resource_id: Uuid,
    zone: String,
    pending: Option<JoinHandle<()>>,
    config: OrchestratorConfig,
) {
    if let Some(task) = pending {
        debug!(resource_id = %resource_id, "waiting for in-flight lifecycle task");
        if let Err(e) = task.await {
            warn!(resource_id = %resource_id, error = %e, "in-flight lifecycle task panicked");
        }
    }

    let resource = match store.resource(resource_id).await {
        Ok(resource) => resource,
        Err(e) => {
            error!(resource_id = %resource_id, error = %e, "resource read failed, abandoning teardown");
            return;
        }
    };

    if resource.status.is_terminal() {
        info!(
            resource_id = %resource_id,
            status = %resource.status,
            "resource reached a terminal state before teardown, nothing to delete"
        );
        return;
    }

    if let Err(e) = store
        .update_resource_status(resource_id, ResourceStatus::Destroying)
        .await
    {
        error!(resource_id = %resource_id, error = %e, "destroying-status write failed, abandoning teardown");
        return;
    }

    let next = match timeout(
        config.remote_timeout,
        provider.delete_instance(&zone, &resource.handle),
    )
    .await
    {
        Ok(Ok(())) => ResourceStatus::Destroyed,
        Ok(Err(e)) => {
            warn!(resource_id = %resource_id, error = %e, "instance deletion failed");
            ResourceStatus::Failed
        }
        Err(_) => {
            warn!(
                resource_id = %resource_id,
                timeout_secs = config.remote_timeout.as_secs(),
                "instance deletion timed out"
            );
            ResourceStatus::Failed
        }
    };

    match store.update_resource_status(resource_id, next).await {
        Ok(()) => info!(resource_id = %resource_id, status = %next, "teardown finished"),
        Err(e) => error!(resource_id = %resource_id, error = %e, "final status write failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_handle_is_rfc1035() {
        let handle = generate_handle();
        assert!(handle.starts_with("rig-"));
        assert_eq!(handle.len(), 14);
        assert!(handle
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_generate_handle_is_unique() {
        assert_ne!(generate_handle(), generate_handle());
    }

    #[test]
    fn test_config_default() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.settle_delay, Duration::from_secs(10));
        assert_eq!(config.remote_timeout, Duration::from_secs(300));
    }
}
