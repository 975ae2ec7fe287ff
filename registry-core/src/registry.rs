//! Main registry orchestration layer
//!
//! Ties together state, storage, actor, and metrics into the public API.
//!
//! # Example
//!
//! ```no_run
//! use registry_core::{Config, Principal, Registry, Role};
//!
//! #[tokio::main]
//! async fn main() -> registry_core::Result<()> {
//!     let config = Config::default();
//!     let owner = config.owner.clone();
//!     let registry = Registry::open(config).await?;
//!
//!     let minter = Principal::new("minter");
//!     registry.grant_role(&owner, Role::Minter, &minter).await?;
//!     let batch = registry.mint(&minter, &Principal::new("alice"), 5).await?;
//!     println!("minted {:?}", batch);
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_registry_actor, RegistryHandle},
    metrics::Metrics,
    state::{RegistryState, RegistryStats},
    storage::Storage,
    types::{BatchMint, Principal, RegistryEvent, Role, SequencedEvent, TokenId},
    Config, Error, Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Main registry interface
pub struct Registry {
    /// Actor handle for serialized operations
    handle: RegistryHandle,

    /// Direct storage access (durable event log reads)
    storage: Arc<Storage>,

    /// Notification fan-out
    events_tx: broadcast::Sender<SequencedEvent>,

    /// Metrics collector
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Registry {
    /// Open registry with configuration.
    ///
    /// Restores the persisted ledger if the data directory holds one,
    /// otherwise seeds fresh state with the configured owner as ADMIN.
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let storage = Arc::new(Storage::open(&config)?);

        let state = match storage.load_state()? {
            Some(mut state) => {
                state.set_limits(&config.limits);
                tracing::info!(
                    total_supply = state.stats().total_supply,
                    next_token_id = state.stats().next_token_id,
                    destroyed = state.stats().destroyed,
                    "restored registry state"
                );
                state
            }
            None => {
                let state =
                    RegistryState::new(config.owner.clone(), config.max_token_id, &config.limits)?;
                storage.commit(&state, &[])?;
                tracing::info!(
                    owner = %config.owner,
                    max_token_id = config.max_token_id,
                    "created registry"
                );
                state
            }
        };

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("failed to register metrics: {}", e)))?;
        metrics.set_total_supply(state.stats().total_supply as i64);

        let (events_tx, _) = broadcast::channel(config.mailbox.event_buffer);

        let handle = spawn_registry_actor(
            state,
            storage.clone(),
            events_tx.clone(),
            metrics.clone(),
            config.mailbox.capacity,
        );

        Ok(Self {
            handle,
            storage,
            events_tx,
            metrics,
            config,
        })
    }

    // Mutating operations

    /// Mint a contiguous batch of `quantity` tokens to `to` (MINTER only).
    ///
    /// Returns `None` after destruction: the call succeeds with no effect.
    pub async fn mint(
        &self,
        caller: &Principal,
        to: &Principal,
        quantity: u32,
    ) -> Result<Option<BatchMint>> {
        self.handle
            .mint(caller.clone(), to.clone(), quantity)
            .await
    }

    /// Burn an existing token (ADMIN only). The ID is never reissued.
    pub async fn burn(&self, caller: &Principal, token_id: TokenId) -> Result<()> {
        self.handle.burn(caller.clone(), token_id).await
    }

    /// Replace the supply cap (ADMIN only).
    pub async fn set_max_token_id(&self, caller: &Principal, value: TokenId) -> Result<()> {
        self.handle.set_max_token_id(caller.clone(), value).await
    }

    /// Grant a role (ADMIN only, idempotent).
    pub async fn grant_role(
        &self,
        caller: &Principal,
        role: Role,
        principal: &Principal,
    ) -> Result<()> {
        self.handle
            .grant_role(caller.clone(), role, principal.clone())
            .await
    }

    /// Revoke a role (ADMIN only, idempotent).
    pub async fn revoke_role(
        &self,
        caller: &Principal,
        role: Role,
        principal: &Principal,
    ) -> Result<()> {
        self.handle
            .revoke_role(caller.clone(), role, principal.clone())
            .await
    }

    /// Destroy the registry (ADMIN only). Irreversible; any registry-held
    /// value is conceptually forwarded to `beneficiary`.
    pub async fn destroy(&self, caller: &Principal, beneficiary: &Principal) -> Result<()> {
        self.handle
            .destroy(caller.clone(), beneficiary.clone())
            .await
    }

    // Reads

    /// Current owner of a token
    pub async fn owner_of(&self, token_id: TokenId) -> Result<Principal> {
        self.handle.owner_of(token_id).await
    }

    /// Number of tokens currently owned by a principal
    pub async fn balance_of(&self, principal: &Principal) -> Result<u64> {
        self.handle.balance_of(principal.clone()).await
    }

    /// Paginated view of a principal's ownership index
    pub async fn tokens_of(
        &self,
        principal: &Principal,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<TokenId>> {
        self.handle
            .tokens_of(principal.clone(), offset, limit)
            .await
    }

    /// Next identifier to be issued
    pub async fn next_token_id(&self) -> Result<TokenId> {
        self.handle.next_token_id().await
    }

    /// Current inclusive cap on issued identifiers
    pub async fn max_token_id(&self) -> Result<TokenId> {
        self.handle.max_token_id().await
    }

    /// Count of currently-existing tokens
    pub async fn total_supply(&self) -> Result<u64> {
        self.handle.total_supply().await
    }

    /// Check role membership
    pub async fn has_role(&self, role: Role, principal: &Principal) -> Result<bool> {
        self.handle.has_role(role, principal.clone()).await
    }

    /// Monitoring snapshot; keeps reporting frozen values after destruction
    pub async fn stats(&self) -> Result<RegistryStats> {
        self.handle.stats().await
    }

    // Collection constants

    /// Collection name, as configured
    pub fn name(&self) -> &str {
        &self.config.collection.name
    }

    /// Collection symbol, as configured
    pub fn symbol(&self) -> &str {
        &self.config.collection.symbol
    }

    /// Base URI for token metadata, returned verbatim
    pub fn base_uri(&self) -> &str {
        &self.config.collection.base_uri
    }

    // Observability

    /// Subscribe to notifications. Events committed after this call are
    /// delivered in sequence order.
    pub fn subscribe(&self) -> broadcast::Receiver<SequencedEvent> {
        self.events_tx.subscribe()
    }

    /// Read up to `limit` persisted events starting at `from_seq`
    /// (the durable log consumed by indexers)
    pub fn events(&self, from_seq: u64, limit: usize) -> Result<Vec<SequencedEvent>> {
        self.storage.events(from_seq, limit)
    }

    /// Approximate size of the durable event log
    pub fn event_count(&self) -> Result<u64> {
        self.storage.event_count()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Ledger consistency audit
    pub async fn verify_invariants(&self) -> Result<()> {
        self.handle.verify_invariants().await
    }

    /// Check ownership conservation against the durable event log.
    ///
    /// Replays every transfer notification ever committed and verifies the
    /// reconstructed ownership count matches the live supply. A mismatch
    /// means the log and the snapshot have diverged.
    pub async fn check_ownership_conservation(&self) -> Result<bool> {
        let mut owners: HashMap<TokenId, Principal> = HashMap::new();
        let mut from_seq = 1u64;

        loop {
            let batch = self.storage.events(from_seq, 1024)?;
            if batch.is_empty() {
                break;
            }
            for event in &batch {
                if let RegistryEvent::Transfer { to, token_id, .. } = &event.event {
                    match to {
                        Some(to) => {
                            owners.insert(*token_id, to.clone());
                        }
                        None => {
                            owners.remove(token_id);
                        }
                    }
                }
                from_seq = event.seq + 1;
            }
        }

        let stats = self.stats().await?;
        Ok(owners.len() as u64 == stats.total_supply)
    }

    /// Shutdown registry
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_registry() -> (Registry, Principal, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        config.max_token_id = 100;

        let owner = config.owner.clone();
        let registry = Registry::open(config).await.unwrap();
        (registry, owner, temp_dir)
    }

    #[tokio::test]
    async fn test_registry_open() {
        let (registry, owner, _temp) = create_test_registry().await;
        assert!(registry.has_role(Role::Admin, &owner).await.unwrap());
        assert_eq!(registry.next_token_id().await.unwrap(), 1);
        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_collection_constants() {
        let (registry, _, _temp) = create_test_registry().await;
        assert_eq!(registry.name(), "Token Registry");
        assert_eq!(registry.symbol(), "REG");
        assert_eq!(registry.base_uri(), "http://localhost:3000/");
        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_mint_and_enumerate() {
        let (registry, owner, _temp) = create_test_registry().await;
        let minter = Principal::new("minter");
        let alice = Principal::new("alice");

        registry
            .grant_role(&owner, Role::Minter, &minter)
            .await
            .unwrap();
        let batch = registry.mint(&minter, &alice, 3).await.unwrap().unwrap();
        assert_eq!(batch.first_token_id, 1);
        assert_eq!(batch.last_token_id(), 3);

        assert_eq!(registry.total_supply().await.unwrap(), 3);
        assert_eq!(registry.balance_of(&alice).await.unwrap(), 3);
        assert_eq!(registry.tokens_of(&alice, 0, 10).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(registry.metrics().tokens_minted_total.get(), 3);

        registry.verify_invariants().await.unwrap();
        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_event_log_and_conservation() {
        let (registry, owner, _temp) = create_test_registry().await;
        let minter = Principal::new("minter");

        registry
            .grant_role(&owner, Role::Minter, &minter)
            .await
            .unwrap();
        registry
            .mint(&minter, &minter, 2)
            .await
            .unwrap()
            .unwrap();
        registry.burn(&owner, 1).await.unwrap();

        // grant + batch mint + 2 transfers + burn transfer
        let events = registry.events(1, 100).unwrap();
        assert_eq!(events.len(), 5);
        // Approximate count; just exercise the path
        registry.event_count().unwrap();
        let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);

        assert!(registry.check_ownership_conservation().await.unwrap());
        registry.shutdown().await.unwrap();
    }
}
