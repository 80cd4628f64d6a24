//! Compute Engine API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::models::{
    AcceleratorConfig, AccessConfigDefinition, AttachedDiskDefinition, GceInstance,
    InitializeParams, InsertInstanceRequest, Metadata, MetadataItem, NetworkInterfaceDefinition,
    Operation, Scheduling,
};
use crate::providers::traits::{ComputeProvider, ComputeProviderError, LaunchInstanceRequest};

/// Base URL for the Compute Engine API.
const API_BASE_URL: &str = "https://compute.googleapis.com/compute/v1";

/// Default timeout for a single API request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Polling interval while waiting on a zone operation.
const OPERATION_POLL_INTERVAL_SECS: u64 = 3;

/// How long to wait for a zone operation before giving up.
const OPERATION_TIMEOUT_SECS: u64 = 600;

/// Compute Engine provider.
#[derive(Clone)]
pub struct Gce {
    /// HTTP client.
    client: Client,
    /// Project ID.
    project_id: String,
    /// Access token (from service account or user).
    access_token: String,
    /// API base URL, overridable for tests.
    base_url: String,
}

impl Gce {
    /// Create a new Compute Engine provider.
    ///
    /// # Arguments
    /// * `project_id` - GCP project ID
    /// * `access_token` - `OAuth2` access token
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(
        project_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ComputeProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ComputeProviderError::Http)?;

        Ok(Self {
            client,
            project_id: project_id.into(),
            access_token: access_token.into(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API endpoint (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Zone-relative resource URL.
    fn zone_url(&self, zone: &str, tail: &str) -> String {
        format!(
            "{}/projects/{}/zones/{}/{}",
            self.base_url, self.project_id, zone, tail
        )
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ComputeProviderError> {
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T, B>(&self, url: &str, body: &B) -> Result<T, ComputeProviderError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        debug!(url = %url, "POST request");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Make an authenticated DELETE request. A missing resource is not an
    /// error; deletion is idempotent from the caller's point of view.
    async fn delete(&self, url: &str) -> Result<Option<Operation>, ComputeProviderError> {
        debug!(url = %url, "DELETE request");

        let response = self
            .client
            .delete(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::handle_response(response).await.map(Some)
    }

    /// Handle API response, parsing JSON or mapping the error status.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComputeProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ComputeProviderError::Serialization(e)
            })
        } else if status == StatusCode::NOT_FOUND {
            Err(ComputeProviderError::NotFound(text))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ComputeProviderError::Auth(text))
        } else {
            Err(ComputeProviderError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    /// Poll a zone operation until it reaches `DONE`.
    async fn wait_zone_operation(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<(), ComputeProviderError> {
        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(OPERATION_TIMEOUT_SECS);

        loop {
            let url = self.zone_url(zone, &format!("operations/{name}"));
            let operation: Operation = self.get(&url).await?;

            debug!(
                operation = %name,
                status = %operation.status,
                elapsed_secs = start.elapsed().as_secs(),
                "Polling zone operation"
            );

            if operation.status == "DONE" {
                if let Some(error) = operation.error {
                    let message = error
                        .errors
                        .iter()
                        .filter_map(|e| e.message.clone())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(ComputeProviderError::Operation(message));
                }
                return Ok(());
            }

            if start.elapsed() > timeout {
                return Err(ComputeProviderError::Timeout(OPERATION_TIMEOUT_SECS));
            }

            tokio::time::sleep(Duration::from_secs(OPERATION_POLL_INTERVAL_SECS)).await;
        }
    }

    /// External NAT address of an instance, if one is assigned.
    fn external_address(instance: &GceInstance) -> Option<String> {
        instance
            .network_interfaces
            .first()
            .and_then(|ni| ni.access_configs.first())
            .and_then(|ac| ac.nat_i_p.clone())
    }
}

#[async_trait]
impl ComputeProvider for Gce {
    async fn launch_instance(
        &self,
        req: LaunchInstanceRequest,
    ) -> Result<(), ComputeProviderError> {
        info!(
            name = %req.name,
            machine_type = %req.machine_type,
            zone = %req.zone,
            gpu_type = %req.gpu_type,
            "Creating Compute Engine instance"
        );

        let guest_accelerators = if req.gpu_count > 0 {
            vec![AcceleratorConfig {
                accelerator_count: req.gpu_count,
                accelerator_type: format!(
                    "projects/{}/zones/{}/acceleratorTypes/{}",
                    self.project_id, req.zone, req.gpu_type
                ),
            }]
        } else {
            vec![]
        };

        let body = InsertInstanceRequest {
            name: req.name.clone(),
            machine_type: format!("zones/{}/machineTypes/{}", req.zone, req.machine_type),
            scheduling: Scheduling {
                automatic_restart: true,
                on_host_maintenance: "TERMINATE".to_string(),
                provisioning_model: "STANDARD".to_string(),
            },
            disks: vec![AttachedDiskDefinition {
                boot: true,
                auto_delete: true,
                disk_type: "PERSISTENT".to_string(),
                initialize_params: InitializeParams {
                    disk_size_gb: req.disk_gb.to_string(),
                },
            }],
            network_interfaces: vec![NetworkInterfaceDefinition {
                stack_type: "IPV4_ONLY".to_string(),
                subnetwork: format!(
                    "projects/{}/regions/{}/subnetworks/default",
                    self.project_id, req.region
                ),
                access_configs: vec![AccessConfigDefinition {
                    name: "External NAT".to_string(),
                    network_tier: "PREMIUM".to_string(),
                }],
            }],
            metadata: req.startup_script.map(|script| Metadata {
                items: vec![MetadataItem {
                    key: "startup-script".to_string(),
                    value: script,
                }],
            }),
            guest_accelerators,
            source_machine_image: req.image,
        };

        let url = self.zone_url(&req.zone, "instances");
        let operation: Operation = self.post(&url, &body).await?;
        self.wait_zone_operation(&req.zone, &operation.name).await?;

        info!(name = %req.name, "Instance created");
        Ok(())
    }

    async fn instance_address(
        &self,
        zone: &str,
        name: &str,
    ) -> Result<String, ComputeProviderError> {
        let url = self.zone_url(zone, &format!("instances/{name}"));
        let instance: GceInstance = self.get(&url).await?;

        Self::external_address(&instance)
            .ok_or_else(|| ComputeProviderError::AddressUnavailable(name.to_string()))
    }

    async fn delete_instance(&self, zone: &str, name: &str) -> Result<(), ComputeProviderError> {
        info!(name = %name, zone = %zone, "Deleting Compute Engine instance");

        let url = self.zone_url(zone, &format!("instances/{name}"));
        match self.delete(&url).await? {
            Some(operation) => {
                self.wait_zone_operation(zone, &operation.name).await?;
                info!(name = %name, "Instance deleted");
            }
            None => {
                warn!(name = %name, "Instance already gone");
            }
        }
        Ok(())
    }
}
