//! Provisioning orchestrator and metering loop for the Rig GPU rental
//! platform.
//!
//! Two services live here, both consuming the capabilities defined by
//! `rig-ledger` and `rig-cloud`:
//!
//! - [`Orchestrator`] — accepts provisioning and teardown requests, persists
//!   the synchronous rows, and drives each resource's lifecycle state
//!   machine in a spawned task. A registry keyed by resource id guarantees a
//!   single writer per resource.
//! - [`Metering`] — the process-lifetime billing loop that appends one
//!   charge per active resource per cycle.
//!
//! The HTTP layer in front of these services is deliberately out of scope;
//! request handlers call [`Orchestrator::request_provision`] /
//! [`Orchestrator::request_teardown`] and poll the store for status.

pub mod error;
pub mod metering;
pub mod orchestrator;

pub use error::OrchestratorError;
pub use metering::{CycleReport, Metering, MeteringConfig};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
