//! Google Compute Engine provider.
//!
//! Implements the [`ComputeProvider`] trait against the Compute Engine REST
//! API. Instance insert and delete both return a zone operation, which the
//! client polls to completion so callers observe a confirmed result rather
//! than an accepted request.
//!
//! [`ComputeProvider`]: crate::ComputeProvider

mod client;
mod models;

pub use client::Gce;
pub use models::*;
