//! Actor-based concurrency for the registry
//!
//! Single-writer pattern: one Tokio task owns the `RegistryState` and is the
//! only code that mutates it. Callers talk to it through a bounded mailbox,
//! which makes every operation atomic and totally ordered, the strict
//! serializability the ledger invariants depend on.
//!
//! Commit order within a mutation: validate on a staged copy, write storage,
//! swap the state in, publish events, update metrics, reply.

use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::state::{RegistryState, RegistryStats};
use crate::storage::Storage;
use crate::types::{BatchMint, Principal, Role, SequencedEvent, TokenId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Message sent to the registry actor
pub enum RegistryMessage {
    /// Mint a batch of tokens
    Mint {
        /// Authenticated caller
        caller: Principal,
        /// Recipient
        to: Principal,
        /// Batch size
        quantity: u32,
        /// Response channel
        response: oneshot::Sender<Result<Option<BatchMint>>>,
    },

    /// Burn a token
    Burn {
        /// Authenticated caller
        caller: Principal,
        /// Token to burn
        token_id: TokenId,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Replace the supply cap
    SetMaxTokenId {
        /// Authenticated caller
        caller: Principal,
        /// New inclusive cap
        value: TokenId,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Grant a role
    GrantRole {
        /// Authenticated caller
        caller: Principal,
        /// Role to grant
        role: Role,
        /// Grantee
        principal: Principal,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Revoke a role
    RevokeRole {
        /// Authenticated caller
        caller: Principal,
        /// Role to revoke
        role: Role,
        /// Former member
        principal: Principal,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Terminal lifecycle transition
    Destroy {
        /// Authenticated caller
        caller: Principal,
        /// Value recipient
        beneficiary: Principal,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Current owner of a token
    OwnerOf {
        /// Token to look up
        token_id: TokenId,
        /// Response channel
        response: oneshot::Sender<Result<Principal>>,
    },

    /// Current balance of a principal
    BalanceOf {
        /// Principal to look up
        principal: Principal,
        /// Response channel
        response: oneshot::Sender<Result<u64>>,
    },

    /// Paginated ownership enumeration
    TokensOf {
        /// Principal to enumerate
        principal: Principal,
        /// Start position in the ownership index
        offset: u64,
        /// Page size
        limit: u32,
        /// Response channel
        response: oneshot::Sender<Result<Vec<TokenId>>>,
    },

    /// Next identifier to be issued
    NextTokenId {
        /// Response channel
        response: oneshot::Sender<Result<TokenId>>,
    },

    /// Current supply cap
    MaxTokenId {
        /// Response channel
        response: oneshot::Sender<Result<TokenId>>,
    },

    /// Count of currently-existing tokens
    TotalSupply {
        /// Response channel
        response: oneshot::Sender<Result<u64>>,
    },

    /// Role membership check
    HasRole {
        /// Role to check
        role: Role,
        /// Principal to check
        principal: Principal,
        /// Response channel
        response: oneshot::Sender<Result<bool>>,
    },

    /// Monitoring snapshot (served even after destruction)
    Stats {
        /// Response channel
        response: oneshot::Sender<RegistryStats>,
    },

    /// Ledger consistency audit
    VerifyInvariants {
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes registry messages
pub struct RegistryActor {
    /// Ledger state (exclusively owned)
    state: RegistryState,

    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<RegistryMessage>,

    /// Notification fan-out
    events_tx: broadcast::Sender<SequencedEvent>,

    /// Metrics collector
    metrics: Metrics,
}

impl RegistryActor {
    /// Create new actor
    pub fn new(
        state: RegistryState,
        storage: Arc<Storage>,
        mailbox: mpsc::Receiver<RegistryMessage>,
        events_tx: broadcast::Sender<SequencedEvent>,
        metrics: Metrics,
    ) -> Self {
        Self {
            state,
            storage,
            mailbox,
            events_tx,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if matches!(msg, RegistryMessage::Shutdown) {
                break;
            }
            self.handle_message(msg);
        }
        tracing::debug!("registry actor stopped");
    }

    fn handle_message(&mut self, msg: RegistryMessage) {
        match msg {
            RegistryMessage::Mint {
                caller,
                to,
                quantity,
                response,
            } => {
                let _ = response.send(self.mint(&caller, &to, quantity));
            }

            RegistryMessage::Burn {
                caller,
                token_id,
                response,
            } => {
                let _ = response.send(self.burn(&caller, token_id));
            }

            RegistryMessage::SetMaxTokenId {
                caller,
                value,
                response,
            } => {
                let _ = response.send(self.set_max_token_id(&caller, value));
            }

            RegistryMessage::GrantRole {
                caller,
                role,
                principal,
                response,
            } => {
                let _ = response.send(self.grant_role(&caller, role, &principal));
            }

            RegistryMessage::RevokeRole {
                caller,
                role,
                principal,
                response,
            } => {
                let _ = response.send(self.revoke_role(&caller, role, &principal));
            }

            RegistryMessage::Destroy {
                caller,
                beneficiary,
                response,
            } => {
                let _ = response.send(self.destroy(&caller, &beneficiary));
            }

            RegistryMessage::OwnerOf { token_id, response } => {
                let _ = response.send(self.state.owner_of(token_id));
            }

            RegistryMessage::BalanceOf {
                principal,
                response,
            } => {
                let _ = response.send(self.state.balance_of(&principal));
            }

            RegistryMessage::TokensOf {
                principal,
                offset,
                limit,
                response,
            } => {
                let _ = response.send(self.state.tokens_of(&principal, offset, limit));
            }

            RegistryMessage::NextTokenId { response } => {
                let _ = response.send(self.state.next_token_id());
            }

            RegistryMessage::MaxTokenId { response } => {
                let _ = response.send(self.state.max_token_id());
            }

            RegistryMessage::TotalSupply { response } => {
                let _ = response.send(self.state.total_supply());
            }

            RegistryMessage::HasRole {
                role,
                principal,
                response,
            } => {
                let _ = response.send(self.state.has_role(role, &principal));
            }

            RegistryMessage::Stats { response } => {
                let _ = response.send(self.state.stats());
            }

            RegistryMessage::VerifyInvariants { response } => {
                let _ = response.send(self.state.verify_invariants());
            }

            RegistryMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn publish(&self, events: &[SequencedEvent]) {
        for event in events {
            // No subscribers is fine; the durable log already has the event
            let _ = self.events_tx.send(event.clone());
        }
        self.metrics.record_events(events.len());
    }

    fn mint(&mut self, caller: &Principal, to: &Principal, quantity: u32) -> Result<Option<BatchMint>> {
        if self.state.is_destroyed() {
            return Ok(None);
        }

        // Stage on a copy so a failed storage commit leaves memory untouched
        let mut staged = self.state.clone();
        let (batch, events) = match staged.mint(caller, to, quantity)? {
            Some(outcome) => outcome,
            None => return Ok(None),
        };

        self.storage.commit(&staged, &events)?;
        self.state = staged;
        self.publish(&events);
        self.metrics.record_mint(batch.quantity);

        tracing::debug!(
            to = %batch.to,
            first_token_id = batch.first_token_id,
            quantity = batch.quantity,
            "minted batch"
        );

        Ok(Some(batch))
    }

    fn burn(&mut self, caller: &Principal, token_id: TokenId) -> Result<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }

        let mut staged = self.state.clone();
        let events = staged.burn(caller, token_id)?;

        self.storage.commit(&staged, &events)?;
        self.state = staged;
        self.publish(&events);
        self.metrics.record_burn();

        tracing::debug!(token_id, "burned token");

        Ok(())
    }

    fn set_max_token_id(&mut self, caller: &Principal, value: TokenId) -> Result<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }

        let mut staged = self.state.clone();
        staged.set_max_token_id(caller, value)?;

        self.storage.commit(&staged, &[])?;
        self.state = staged;

        tracing::info!(max_token_id = value, "updated max token id");

        Ok(())
    }

    fn grant_role(&mut self, caller: &Principal, role: Role, principal: &Principal) -> Result<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }

        let mut staged = self.state.clone();
        let events = staged.grant_role(caller, role, principal)?;
        if events.is_empty() {
            // Already held: idempotent no-op
            return Ok(());
        }

        self.storage.commit(&staged, &events)?;
        self.state = staged;
        self.publish(&events);

        tracing::info!(role = %role, principal = %principal, "granted role");

        Ok(())
    }

    fn revoke_role(&mut self, caller: &Principal, role: Role, principal: &Principal) -> Result<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }

        let mut staged = self.state.clone();
        let events = staged.revoke_role(caller, role, principal)?;
        if events.is_empty() {
            return Ok(());
        }

        self.storage.commit(&staged, &events)?;
        self.state = staged;
        self.publish(&events);

        tracing::info!(role = %role, principal = %principal, "revoked role");

        Ok(())
    }

    fn destroy(&mut self, caller: &Principal, beneficiary: &Principal) -> Result<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }

        let mut staged = self.state.clone();
        staged.destroy(caller, beneficiary)?;

        // The terminal transition is the final storage write
        self.storage.commit(&staged, &[])?;
        self.state = staged;

        tracing::info!(beneficiary = %beneficiary, "registry destroyed");

        Ok(())
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryMessage>,
}

impl RegistryHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<RegistryMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RegistryMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("response channel closed".to_string()))
    }

    /// Mint a batch of tokens
    pub async fn mint(
        &self,
        caller: Principal,
        to: Principal,
        quantity: u32,
    ) -> Result<Option<BatchMint>> {
        self.request(|response| RegistryMessage::Mint {
            caller,
            to,
            quantity,
            response,
        })
        .await?
    }

    /// Burn a token
    pub async fn burn(&self, caller: Principal, token_id: TokenId) -> Result<()> {
        self.request(|response| RegistryMessage::Burn {
            caller,
            token_id,
            response,
        })
        .await?
    }

    /// Replace the supply cap
    pub async fn set_max_token_id(&self, caller: Principal, value: TokenId) -> Result<()> {
        self.request(|response| RegistryMessage::SetMaxTokenId {
            caller,
            value,
            response,
        })
        .await?
    }

    /// Grant a role
    pub async fn grant_role(
        &self,
        caller: Principal,
        role: Role,
        principal: Principal,
    ) -> Result<()> {
        self.request(|response| RegistryMessage::GrantRole {
            caller,
            role,
            principal,
            response,
        })
        .await?
    }

    /// Revoke a role
    pub async fn revoke_role(
        &self,
        caller: Principal,
        role: Role,
        principal: Principal,
    ) -> Result<()> {
        self.request(|response| RegistryMessage::RevokeRole {
            caller,
            role,
            principal,
            response,
        })
        .await?
    }

    /// Terminal lifecycle transition
    pub async fn destroy(&self, caller: Principal, beneficiary: Principal) -> Result<()> {
        self.request(|response| RegistryMessage::Destroy {
            caller,
            beneficiary,
            response,
        })
        .await?
    }

    /// Current owner of a token
    pub async fn owner_of(&self, token_id: TokenId) -> Result<Principal> {
        self.request(|response| RegistryMessage::OwnerOf { token_id, response })
            .await?
    }

    /// Current balance of a principal
    pub async fn balance_of(&self, principal: Principal) -> Result<u64> {
        self.request(|response| RegistryMessage::BalanceOf {
            principal,
            response,
        })
        .await?
    }

    /// Paginated ownership enumeration
    pub async fn tokens_of(
        &self,
        principal: Principal,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<TokenId>> {
        self.request(|response| RegistryMessage::TokensOf {
            principal,
            offset,
            limit,
            response,
        })
        .await?
    }

    /// Next identifier to be issued
    pub async fn next_token_id(&self) -> Result<TokenId> {
        self.request(|response| RegistryMessage::NextTokenId { response })
            .await?
    }

    /// Current supply cap
    pub async fn max_token_id(&self) -> Result<TokenId> {
        self.request(|response| RegistryMessage::MaxTokenId { response })
            .await?
    }

    /// Count of currently-existing tokens
    pub async fn total_supply(&self) -> Result<u64> {
        self.request(|response| RegistryMessage::TotalSupply { response })
            .await?
    }

    /// Role membership check
    pub async fn has_role(&self, role: Role, principal: Principal) -> Result<bool> {
        self.request(|response| RegistryMessage::HasRole {
            role,
            principal,
            response,
        })
        .await?
    }

    /// Monitoring snapshot
    pub async fn stats(&self) -> Result<RegistryStats> {
        self.request(|response| RegistryMessage::Stats { response })
            .await
    }

    /// Ledger consistency audit
    pub async fn verify_invariants(&self) -> Result<()> {
        self.request(|response| RegistryMessage::VerifyInvariants { response })
            .await?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(RegistryMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the registry actor
pub fn spawn_registry_actor(
    state: RegistryState,
    storage: Arc<Storage>,
    events_tx: broadcast::Sender<SequencedEvent>,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> RegistryHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = RegistryActor::new(state, storage, rx, events_tx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    RegistryHandle::new(tx)
}
