//! Cross-domain messaging interface and the reference messenger.
//!
//! The pool consumes only the narrow remote-address-lookup / fee-quote /
//! dispatch surface of the transport; the transport internals are out of
//! scope. `ChannelMessenger` is the in-suite implementation backing that
//! interface with a remote-pool registry and a flat fee per dispatch.
use odra::prelude::*;
use odra::casper_types::{U256, U512};
use crate::pool::errors::PoolError;

/// The pool's view of the cross-domain transport.
#[odra::external_contract]
pub trait Messenger {
    /// Registered pool address on the destination domain for a local
    /// asset, if any.
    fn remote_pool_address(&self, token: Address, destination_domain: u32) -> Option<Address>;

    /// Quoted payment required to move an amount to the destination
    /// domain.
    fn quote_transfer_fee(&self, destination_domain: u32, token: Address, amount: U256) -> U512;

    /// Dispatch an asset transfer towards the destination domain. The
    /// underlying certificates and the payment share have already been
    /// handed to the messenger when this is called.
    fn dispatch_transfer(
        &mut self,
        destination_domain: u32,
        token: Address,
        sub_id: Option<U256>,
        amount: U256,
        recipient: Address,
        payment: U512,
    );
}

/// Event emitted when a remote pool mapping is registered.
#[odra::event]
pub struct RemotePoolRegistered {
    /// Destination domain identifier
    pub destination_domain: u32,
    /// Local certificate contract
    pub token: Address,
    /// Pool address on the destination domain
    pub remote_pool: Address,
}

/// Event emitted when a local pool's dispatch authorization changes.
#[odra::event]
pub struct DispatcherUpdated {
    /// The pool contract
    pub pool: Address,
    /// Whether the pool may dispatch transfers
    pub authorized: bool,
}

/// Event emitted for each dispatched cross-domain transfer.
#[odra::event]
pub struct TransferDispatched {
    /// Destination domain identifier
    pub destination_domain: u32,
    /// Local certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Underlying amount moved
    pub amount: U256,
    /// Recipient on the destination domain
    pub recipient: Address,
    /// Payment forwarded with the transfer
    pub payment: U512,
}

/// Registry-backed messenger with a flat per-dispatch fee.
#[odra::module]
pub struct ChannelMessenger {
    /// Messenger admin
    admin: Var<Address>,
    /// (local asset, destination domain) -> remote pool address
    remote_pools: Mapping<(Address, u32), Address>,
    /// Local pool contracts allowed to dispatch transfers
    dispatchers: Mapping<Address, bool>,
    /// Flat payment required per dispatch
    base_fee: Var<U512>,
    /// Number of transfers dispatched
    dispatch_count: Var<u64>,
}

#[odra::module]
impl ChannelMessenger {
    /// Initialize the messenger. The deployer becomes the admin.
    pub fn init(&mut self, base_fee: U512) {
        self.admin.set(self.env().caller());
        self.base_fee.set(base_fee);
        self.dispatch_count.set(0);
    }

    /// Register the pool address a local asset maps to on a destination
    /// domain.
    pub fn register_remote_pool(
        &mut self,
        token: Address,
        destination_domain: u32,
        remote_pool: Address,
    ) {
        self.only_admin();
        self.remote_pools
            .set(&(token, destination_domain), remote_pool);
        self.env().emit_event(RemotePoolRegistered {
            destination_domain,
            token,
            remote_pool,
        });
    }

    /// Authorize or revoke a local pool as a dispatch caller.
    pub fn set_dispatcher(&mut self, pool: Address, authorized: bool) {
        self.only_admin();
        self.dispatchers.set(&pool, authorized);
        self.env().emit_event(DispatcherUpdated { pool, authorized });
    }

    /// Whether a local pool may dispatch transfers.
    pub fn is_dispatcher(&self, pool: Address) -> bool {
        self.dispatchers.get(&pool).unwrap_or_default()
    }

    /// Registered remote pool for a local asset, if any.
    pub fn remote_pool_address(&self, token: Address, destination_domain: u32) -> Option<Address> {
        self.remote_pools.get(&(token, destination_domain))
    }

    /// Quoted payment for one dispatch. Flat, independent of amount.
    pub fn quote_transfer_fee(
        &self,
        _destination_domain: u32,
        _token: Address,
        _amount: U256,
    ) -> U512 {
        self.base_fee.get_or_default()
    }

    /// Record a dispatch. Only authorized local pools may call this; the
    /// pool has already transferred the certificates and the payment
    /// share to this contract.
    pub fn dispatch_transfer(
        &mut self,
        destination_domain: u32,
        token: Address,
        sub_id: Option<U256>,
        amount: U256,
        recipient: Address,
        payment: U512,
    ) {
        let caller = self.env().caller();
        if !self.dispatchers.get(&caller).unwrap_or_default() {
            self.env().revert(PoolError::Unauthorized);
        }
        if self
            .remote_pools
            .get(&(token, destination_domain))
            .is_none()
        {
            self.env().revert(PoolError::NoRemotePool);
        }
        self.dispatch_count
            .set(self.dispatch_count.get_or_default() + 1);
        self.env().emit_event(TransferDispatched {
            destination_domain,
            token,
            sub_id,
            amount,
            recipient,
            payment,
        });
    }

    /// Number of transfers dispatched so far.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.get_or_default()
    }

    fn only_admin(&self) {
        let admin = self.admin.get_or_revert_with(PoolError::Unauthorized);
        if self.env().caller() != admin {
            self.env().revert(PoolError::Unauthorized);
        }
    }
}
