//! Compute provider integration for the Rig GPU rental platform.
//!
//! This crate is the platform's only contact with the cloud: the
//! [`ComputeProvider`] capability (launch an instance, read its external
//! address, delete it) and a Google Compute Engine implementation of it.
//!
//! Every operation is slow and fallible — instance creation routinely takes
//! minutes — so the fleet orchestrator calls this crate from spawned
//! lifecycle tasks, never from a request path.
//!
//! ## Example
//!
//! ```ignore
//! use rig_cloud::{Gce, ComputeProvider, LaunchInstanceRequest};
//!
//! let gce = Gce::new(project_id, access_token)?;
//!
//! gce.launch_instance(LaunchInstanceRequest { /* shape, image, disk */ }).await?;
//! let address = gce.instance_address("us-central1-a", "rig-4f9a02").await?;
//! gce.delete_instance("us-central1-a", "rig-4f9a02").await?;
//! ```

pub mod providers;

pub use providers::gcp;
pub use providers::{ComputeProvider, ComputeProviderError, Gce, LaunchInstanceRequest};
