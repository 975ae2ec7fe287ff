//! The registry state machine
//!
//! This module is the single place where ledger state mutates: identifier
//! allocation, ownership bookkeeping, supply-cap enforcement, role gating,
//! pagination, and the terminal lifecycle transition. Every mutating
//! operation either fully applies and returns the events it produced, or
//! rejects with no effect. The caller (the actor) is responsible for
//! persisting the state and events atomically.
//!
//! # Lifecycle
//!
//! Once destroyed, mutating operations short-circuit at the top of the entry
//! point and report success without touching state or producing events;
//! state reads fail with [`Error::Destroyed`].

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::roles::RoleStore;
use crate::types::{
    BatchMint, LifecycleState, Principal, RegistryEvent, Role, SequencedEvent, TokenId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token IDs are issued from 1 upward
const INITIAL_TOKEN_ID: TokenId = 1;

/// Frozen snapshot of the registry counters.
///
/// Unlike the public reads, this is served even after destruction: it is the
/// monitoring surface, and reports the values frozen at the terminal
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Next identifier to be issued
    pub next_token_id: TokenId,
    /// Inclusive upper bound on issued identifiers
    pub max_token_id: TokenId,
    /// Number of currently-existing (non-burned) tokens
    pub total_supply: u64,
    /// Whether the registry has reached its terminal state
    pub destroyed: bool,
}

/// Registry ledger state
///
/// Owned exclusively by the single-writer actor; never shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryState {
    /// Next identifier to be issued; monotonically increasing
    next_token_id: TokenId,

    /// Inclusive upper bound on any ever-issued identifier
    max_token_id: TokenId,

    /// Count of currently-existing tokens
    total_supply: u64,

    /// Token -> current owner
    owners: HashMap<TokenId, Principal>,

    /// Owner -> owned tokens, append-ordered at mint time
    holdings: HashMap<Principal, Vec<TokenId>>,

    /// Role membership
    roles: RoleStore,

    /// ACTIVE or terminal DESTROYED
    lifecycle: LifecycleState,

    /// Last assigned event sequence number
    event_seq: u64,

    /// Per-batch mint cap
    max_mint_quantity: u32,

    /// Per-page enumeration cap
    max_page_limit: u32,
}

impl RegistryState {
    /// Create fresh state with the ADMIN role seeded to `owner`.
    pub fn new(owner: Principal, max_token_id: TokenId, limits: &LimitsConfig) -> Result<Self> {
        if owner.is_empty() {
            return Err(Error::InvalidAddress);
        }

        let mut roles = RoleStore::new();
        roles.grant(Role::Admin, owner);

        Ok(Self {
            next_token_id: INITIAL_TOKEN_ID,
            max_token_id,
            total_supply: 0,
            owners: HashMap::new(),
            holdings: HashMap::new(),
            roles,
            lifecycle: LifecycleState::Active,
            event_seq: 0,
            max_mint_quantity: limits.max_mint_quantity,
            max_page_limit: limits.max_page_limit,
        })
    }

    /// Re-apply configured limits after loading a persisted snapshot.
    /// Configuration wins over whatever was stored.
    pub fn set_limits(&mut self, limits: &LimitsConfig) {
        self.max_mint_quantity = limits.max_mint_quantity;
        self.max_page_limit = limits.max_page_limit;
    }

    fn next_event(&mut self, event: RegistryEvent) -> SequencedEvent {
        self.event_seq += 1;
        SequencedEvent {
            seq: self.event_seq,
            timestamp: Utc::now(),
            event,
        }
    }

    fn require_role(&self, role: Role, caller: &Principal) -> Result<()> {
        if self.roles.has_role(role, caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                caller: caller.clone(),
                required: role,
            })
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            Err(Error::Destroyed)
        } else {
            Ok(())
        }
    }

    // Mutating operations

    /// Mint a contiguous batch of `quantity` tokens to `to`.
    ///
    /// Returns the batch receipt and the events to publish, or `None` when
    /// the registry is destroyed (silent no-op success).
    pub fn mint(
        &mut self,
        caller: &Principal,
        to: &Principal,
        quantity: u32,
    ) -> Result<Option<(BatchMint, Vec<SequencedEvent>)>> {
        if self.lifecycle.is_destroyed() {
            return Ok(None);
        }
        self.require_role(Role::Minter, caller)?;

        if to.is_empty() {
            return Err(Error::InvalidAddress);
        }
        if quantity == 0 || quantity > self.max_mint_quantity {
            return Err(Error::InvalidQuantity {
                given: quantity,
                max: self.max_mint_quantity,
            });
        }

        let first = self.next_token_id;
        let last = first
            .checked_add(u64::from(quantity) - 1)
            .filter(|last| *last <= self.max_token_id)
            .ok_or(Error::ExceedsMaxSupply {
                requested: quantity,
                max_token_id: self.max_token_id,
            })?;

        let index = self.holdings.entry(to.clone()).or_default();
        index.reserve(quantity as usize);
        for token_id in first..=last {
            index.push(token_id);
        }
        for token_id in first..=last {
            self.owners.insert(token_id, to.clone());
        }
        self.next_token_id = last + 1;
        self.total_supply += u64::from(quantity);

        let batch = BatchMint {
            to: to.clone(),
            first_token_id: first,
            quantity,
        };

        let mut events = Vec::with_capacity(quantity as usize + 1);
        events.push(self.next_event(RegistryEvent::Mint(batch.clone())));
        for token_id in first..=last {
            events.push(self.next_event(RegistryEvent::Transfer {
                from: None,
                to: Some(to.clone()),
                token_id,
            }));
        }

        Ok(Some((batch, events)))
    }

    /// Burn an existing token.
    ///
    /// The identifier is retired permanently: `next_token_id` does not move
    /// back and the ID is never reissued. Removal from the owner's index
    /// swaps the last element into the vacated slot (O(1); see DESIGN.md).
    pub fn burn(&mut self, caller: &Principal, token_id: TokenId) -> Result<Vec<SequencedEvent>> {
        if self.lifecycle.is_destroyed() {
            return Ok(Vec::new());
        }
        self.require_role(Role::Admin, caller)?;

        let owner = self
            .owners
            .get(&token_id)
            .cloned()
            .ok_or(Error::NonexistentToken(token_id))?;

        self.owners.remove(&token_id);
        if let Some(index) = self.holdings.get_mut(&owner) {
            if let Some(pos) = index.iter().position(|id| *id == token_id) {
                index.swap_remove(pos);
            }
            if index.is_empty() {
                self.holdings.remove(&owner);
            }
        }
        self.total_supply -= 1;

        let event = self.next_event(RegistryEvent::Transfer {
            from: Some(owner),
            to: None,
            token_id,
        });
        Ok(vec![event])
    }

    /// Replace the supply cap. Cannot drop below the highest issued ID.
    pub fn set_max_token_id(&mut self, caller: &Principal, value: TokenId) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.require_role(Role::Admin, caller)?;

        let floor = self.next_token_id - 1;
        if value < floor {
            return Err(Error::InvalidValue {
                given: value,
                floor,
            });
        }
        self.max_token_id = value;
        Ok(())
    }

    /// Grant a role. Idempotent: a redundant grant succeeds without an event.
    pub fn grant_role(
        &mut self,
        caller: &Principal,
        role: Role,
        principal: &Principal,
    ) -> Result<Vec<SequencedEvent>> {
        if self.lifecycle.is_destroyed() {
            return Ok(Vec::new());
        }
        self.require_role(Role::Admin, caller)?;
        if principal.is_empty() {
            return Err(Error::InvalidAddress);
        }

        if self.roles.grant(role, principal.clone()) {
            let event = self.next_event(RegistryEvent::RoleGranted {
                role,
                principal: principal.clone(),
            });
            Ok(vec![event])
        } else {
            Ok(Vec::new())
        }
    }

    /// Revoke a role. Idempotent: revoking an unheld role succeeds silently.
    pub fn revoke_role(
        &mut self,
        caller: &Principal,
        role: Role,
        principal: &Principal,
    ) -> Result<Vec<SequencedEvent>> {
        if self.lifecycle.is_destroyed() {
            return Ok(Vec::new());
        }
        self.require_role(Role::Admin, caller)?;
        if principal.is_empty() {
            return Err(Error::InvalidAddress);
        }

        if self.roles.revoke(role, principal) {
            let event = self.next_event(RegistryEvent::RoleRevoked {
                role,
                principal: principal.clone(),
            });
            Ok(vec![event])
        } else {
            Ok(Vec::new())
        }
    }

    /// Transition to the terminal DESTROYED state.
    ///
    /// Irreversible. Any registry-held value is conceptually forwarded to
    /// `beneficiary`. Subsequent mutating calls succeed with zero observable
    /// effects; subsequent state reads fail with [`Error::Destroyed`].
    pub fn destroy(&mut self, caller: &Principal, beneficiary: &Principal) -> Result<()> {
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        self.require_role(Role::Admin, caller)?;
        if beneficiary.is_empty() {
            return Err(Error::InvalidAddress);
        }

        self.lifecycle = LifecycleState::Destroyed {
            beneficiary: beneficiary.clone(),
        };
        Ok(())
    }

    // Reads

    /// Current owner of a token
    pub fn owner_of(&self, token_id: TokenId) -> Result<Principal> {
        self.ensure_active()?;
        self.owners
            .get(&token_id)
            .cloned()
            .ok_or(Error::NonexistentToken(token_id))
    }

    /// Number of tokens currently owned by a principal
    pub fn balance_of(&self, principal: &Principal) -> Result<u64> {
        self.ensure_active()?;
        Ok(self
            .holdings
            .get(principal)
            .map(|index| index.len() as u64)
            .unwrap_or(0))
    }

    /// Paginated view of a principal's ownership index.
    ///
    /// `offset == balance` is valid and yields an empty page.
    pub fn tokens_of(
        &self,
        principal: &Principal,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<TokenId>> {
        self.ensure_active()?;

        if limit == 0 || limit > self.max_page_limit {
            return Err(Error::InvalidLimit {
                given: limit,
                max: self.max_page_limit,
            });
        }

        let index = self.holdings.get(principal).map(Vec::as_slice).unwrap_or(&[]);
        let balance = index.len() as u64;
        if offset > balance {
            return Err(Error::InvalidOffset {
                given: offset,
                max: balance,
            });
        }

        let end = balance.min(offset + u64::from(limit));
        Ok(index[offset as usize..end as usize].to_vec())
    }

    /// Next identifier to be issued
    pub fn next_token_id(&self) -> Result<TokenId> {
        self.ensure_active()?;
        Ok(self.next_token_id)
    }

    /// Current inclusive cap on issued identifiers
    pub fn max_token_id(&self) -> Result<TokenId> {
        self.ensure_active()?;
        Ok(self.max_token_id)
    }

    /// Count of currently-existing tokens
    pub fn total_supply(&self) -> Result<u64> {
        self.ensure_active()?;
        Ok(self.total_supply)
    }

    /// Check role membership
    pub fn has_role(&self, role: Role, principal: &Principal) -> Result<bool> {
        self.ensure_active()?;
        Ok(self.roles.has_role(role, principal))
    }

    /// Whether the registry has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    /// Monitoring snapshot; served even after destruction
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            next_token_id: self.next_token_id,
            max_token_id: self.max_token_id,
            total_supply: self.total_supply,
            destroyed: self.lifecycle.is_destroyed(),
        }
    }

    /// Verify internal consistency of the ledger.
    ///
    /// Checks supply accounting and the ownership index against the owner
    /// map in both directions.
    pub fn verify_invariants(&self) -> Result<()> {
        if self.total_supply != self.owners.len() as u64 {
            return Err(Error::InvariantViolation(format!(
                "total_supply {} != owner count {}",
                self.total_supply,
                self.owners.len()
            )));
        }
        if self.max_token_id + 1 < self.next_token_id {
            return Err(Error::InvariantViolation(format!(
                "max_token_id {} below highest issued id {}",
                self.max_token_id,
                self.next_token_id - 1
            )));
        }

        let mut indexed: u64 = 0;
        for (principal, index) in &self.holdings {
            for token_id in index {
                if *token_id == 0 || *token_id >= self.next_token_id {
                    return Err(Error::InvariantViolation(format!(
                        "index holds never-issued token {}",
                        token_id
                    )));
                }
                match self.owners.get(token_id) {
                    Some(owner) if owner == principal => {}
                    _ => {
                        return Err(Error::InvariantViolation(format!(
                            "token {} indexed under {} but not owned by them",
                            token_id, principal
                        )));
                    }
                }
            }
            indexed += index.len() as u64;
        }
        if indexed != self.total_supply {
            return Err(Error::InvariantViolation(format!(
                "ownership index holds {} entries, expected {}",
                indexed, self.total_supply
            )));
        }

        Ok(())
    }
}
