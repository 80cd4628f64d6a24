//! Resource and ledger domain model for the Rig GPU rental platform.
//!
//! This crate defines what the platform rents out and how it accounts for
//! it:
//!
//! - [`Resource`] — a rented GPU instance and its lifecycle
//!   ([`ResourceStatus`])
//! - [`ServerConfig`] / [`Template`] — the read-only catalog a rental is
//!   priced and booted from
//! - [`LedgerEntry`] — the append-only monetary ledger ([`EntryKind`])
//! - [`LedgerStore`] — the persistence capability the fleet services consume
//! - [`balance`] / [`usage`] — the recomputed-on-demand read side
//!
//! [`MemoryStore`] is the bundled reference store; production deployments
//! implement [`LedgerStore`] over their database of choice.

pub mod balance;
pub mod memory;
pub mod models;
pub mod store;

pub use balance::{balance, usage, AccountUsage};
pub use memory::MemoryStore;
pub use models::{EntryKind, LedgerEntry, Resource, ResourceStatus, ServerConfig, Template};
pub use store::{LedgerStore, StoreError};
