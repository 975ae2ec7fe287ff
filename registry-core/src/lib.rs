//! Token Registry Core
//!
//! Sequentially-numbered, role-gated NFT ledger with a supply cap,
//! controlled burn, batch mint, paginated ownership queries, and an
//! irreversible terminal state.
//!
//! # Architecture
//!
//! - **Single Writer**: one actor task owns the ledger state; every
//!   operation is atomic and totally ordered
//! - **Durable Log**: each commit atomically persists the state snapshot
//!   and the notifications it produced
//! - **Role Gating**: ADMIN and MINTER capability sets guard all mutations
//! - **Terminal Lifecycle**: once destroyed, mutations become silent no-ops
//!
//! # Invariants
//!
//! - Token IDs are issued contiguously from 1 and never reused, even after burn
//! - `total_supply` always equals the number of currently-owned tokens
//! - The cap can never drop below the highest issued ID
//! - DESTROYED is terminal: no state change or notification ever follows it

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications, clippy::all)]

pub mod actor;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod roles;
pub mod state;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use registry::Registry;
pub use state::{RegistryState, RegistryStats};
pub use types::{
    BatchMint, LifecycleState, Principal, RegistryEvent, Role, SequencedEvent, TokenId,
};
