//! CEP-18 compatible pool share token.
//!
//! The share token is embedded in the pool contract as a submodule; the
//! pool mints shares on deposit, burns them on redemption and moves fee
//! shares between accounts without the allowance flow.
use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::TokenError;
use crate::events::{Approval, Transfer};
use crate::math::POOL_DECIMALS;

/// Pool share token module implementing the CEP-18 standard.
#[odra::module]
pub struct PoolShareToken {
    /// Token name
    name: Var<String>,
    /// Token symbol
    symbol: Var<String>,
    /// Total supply of shares
    total_supply: Var<U256>,
    /// Balance mapping: owner -> balance
    balances: Mapping<Address, U256>,
    /// Allowance mapping: owner -> spender -> amount
    allowances: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl PoolShareToken {
    /// Initialize the share token. Decimals are fixed at the pool
    /// precision and are not configurable.
    pub fn init(&mut self, name: String, symbol: String) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.total_supply.set(U256::zero());
    }

    /// Token name
    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    /// Token symbol
    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    /// Share precision, always the pool precision.
    pub fn decimals(&self) -> u8 {
        POOL_DECIMALS
    }

    /// Total shares in circulation
    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    /// Share balance of an address
    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).unwrap_or_default()
    }

    /// Remaining allowance for a spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    /// Transfer shares to another address
    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.transfer_internal(caller, to, amount);
        true
    }

    /// Approve a spender
    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.allowances.set(&(caller, spender), amount);
        self.env().emit_event(Approval {
            owner: caller,
            spender,
            value: amount,
        });
        true
    }

    /// Transfer shares on behalf of another holder (requires approval)
    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        let current = self.allowance(from, caller);
        if current < amount {
            self.env().revert(TokenError::InsufficientAllowance);
        }
        self.allowances.set(&(from, caller), current - amount);
        self.transfer_internal(from, to, amount);
        true
    }

    /// Mint new shares. Only reachable through the owning pool module.
    pub fn mint(&mut self, to: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        self.total_supply.set(self.total_supply() + amount);
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);

        self.env().emit_event(Transfer {
            from: self.env().self_address(),
            to,
            value: amount,
        });
    }

    /// Burn shares from a holder. Only reachable through the owning pool
    /// module.
    pub fn burn(&mut self, from: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.set(&from, balance - amount);
        self.total_supply.set(self.total_supply() - amount);

        self.env().emit_event(Transfer {
            from,
            to: self.env().self_address(),
            value: amount,
        });
    }

    /// Move shares between two accounts without an allowance. Used by the
    /// pool to collect redemption fees out of the caller's balance.
    pub fn transfer_raw(&mut self, from: Address, to: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        self.transfer_internal(from, to, amount);
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);

        self.env().emit_event(Transfer {
            from,
            to,
            value: amount,
        });
    }
}
