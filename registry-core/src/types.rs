//! Core types for the token registry
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Opaque principals (caller authentication happens upstream)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token identifier. Issued sequentially starting at 1, never reused.
pub type TokenId = u64;

/// Opaque authenticated principal identifier (the "address").
///
/// The registry never interprets the contents; an empty string is the
/// null-address analog and is rejected wherever a real principal is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create new principal
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the null-address analog
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability role gating mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administrative role (burn, cap changes, role management, destroy)
    Admin,
    /// Minting role
    Minter,
}

impl Role {
    /// Canonical role tag
    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Minter => "MINTER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Registry lifecycle. DESTROYED is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Normal operation
    Active,
    /// Terminal state; mutating calls become silent no-ops
    Destroyed {
        /// Recipient of any registry-held value at destruction time
        beneficiary: Principal,
    },
}

impl LifecycleState {
    /// Check if the registry has been destroyed
    pub fn is_destroyed(&self) -> bool {
        matches!(self, LifecycleState::Destroyed { .. })
    }
}

/// Receipt for a successful batch mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMint {
    /// Recipient of the batch
    pub to: Principal,

    /// First token ID in the contiguous range
    pub first_token_id: TokenId,

    /// Number of tokens minted
    pub quantity: u32,
}

impl BatchMint {
    /// Last token ID in the contiguous range
    pub fn last_token_id(&self) -> TokenId {
        self.first_token_id + u64::from(self.quantity) - 1
    }
}

/// Observable registry notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// Batch mint notification
    Mint(BatchMint),

    /// Ownership transfer. Mint sets `from = None`, burn sets `to = None`.
    Transfer {
        /// Previous owner (None on mint)
        from: Option<Principal>,
        /// New owner (None on burn)
        to: Option<Principal>,
        /// Token being transferred
        token_id: TokenId,
    },

    /// Role membership granted
    RoleGranted {
        /// Granted role
        role: Role,
        /// New member
        principal: Principal,
    },

    /// Role membership revoked
    RoleRevoked {
        /// Revoked role
        role: Role,
        /// Former member
        principal: Principal,
    },
}

/// Event envelope as stored and published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    /// Strictly increasing sequence number (starts at 1)
    pub seq: u64,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,

    /// The notification payload
    pub event: RegistryEvent,
}
