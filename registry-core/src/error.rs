//! Error types for the registry

use crate::types::{Principal, Role, TokenId};
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Registry errors
#[derive(Error, Debug)]
pub enum Error {
    /// Caller lacks the required role
    #[error("unauthorized: {caller} is missing role {required}")]
    Unauthorized {
        /// Principal that attempted the operation
        caller: Principal,
        /// Role the operation requires
        required: Role,
    },

    /// Empty principal where a real one is required
    #[error("invalid address: principal must be non-empty")]
    InvalidAddress,

    /// Mint quantity outside the configured bounds
    #[error("invalid quantity: {given} (allowed 1..={max})")]
    InvalidQuantity {
        /// Quantity requested
        given: u32,
        /// Maximum allowed per batch
        max: u32,
    },

    /// Pagination limit outside the configured bounds
    #[error("invalid limit: {given} (allowed 1..={max})")]
    InvalidLimit {
        /// Limit requested
        given: u32,
        /// Maximum allowed per page
        max: u32,
    },

    /// Pagination offset past the end of the ownership index
    #[error("invalid offset: {given} (balance is {max})")]
    InvalidOffset {
        /// Offset requested
        given: u64,
        /// Current balance of the queried principal
        max: u64,
    },

    /// Max token id below the highest already-issued ID
    #[error("invalid max token id: {given} (must be at least {floor})")]
    InvalidValue {
        /// Value requested
        given: TokenId,
        /// Highest ID already issued
        floor: TokenId,
    },

    /// Token was never minted or has been burned
    #[error("token {0} does not exist")]
    NonexistentToken(TokenId),

    /// Mint would allocate past the supply cap
    #[error("minting {requested} tokens would exceed max token id {max_token_id}")]
    ExceedsMaxSupply {
        /// Quantity requested
        requested: u32,
        /// Current inclusive cap on issued IDs
        max_token_id: TokenId,
    },

    /// Registry has reached its terminal state; reads are no longer served
    #[error("registry has been destroyed")]
    Destroyed,

    /// Invariant violation (supply accounting, index consistency, etc.)
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Storage error (RocksDB)
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_message_names_caller_and_role() {
        let err = Error::Unauthorized {
            caller: Principal::new("mallory"),
            required: Role::Minter,
        };
        let msg = err.to_string();
        assert!(msg.contains("mallory"));
        assert!(msg.contains("MINTER"));
    }

    #[test]
    fn test_invalid_offset_message() {
        let err = Error::InvalidOffset { given: 2, max: 1 };
        assert_eq!(err.to_string(), "invalid offset: 2 (balance is 1)");
    }
}
