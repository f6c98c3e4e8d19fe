//! Vintage certificate token and the narrow interface pools consume.
//!
//! A vintage asset is one unit-bearing representation of carbon credits
//! from a specific project and time period. `CarbonVintage` is the
//! single-vintage certificate contract of this suite; multi-asset
//! collections expose the same entry points with a `Some(sub_id)`
//! discriminator, which is why every asset-specific call carries the
//! optional identifier.
use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::VintageError;
use crate::events::{Retired, VintageBurned, VintageMinted};

/// Identifies one vintage asset inside a pool.
///
/// `sub_id` is `Some` only when the certificate contract is a multi-asset
/// collection holding several vintages by identifier.
#[odra::odra_type]
pub struct AssetId {
    /// Certificate contract address
    pub token: Address,
    /// Vintage discriminator within a multi-asset collection
    pub sub_id: Option<U256>,
}

/// Descriptive attributes of a vintage, consulted by eligibility filters
/// and used to partition the supply ledger by project.
#[odra::odra_type]
pub struct VintageAttributes {
    /// Identifier of the underlying project; the unit the supply ledger
    /// partitions by
    pub project_id: String,
    /// Geographic region of the project
    pub region: String,
    /// Methodology the credits were issued under
    pub methodology: String,
    /// Start of the vintage period (unix seconds)
    pub vintage_begin: u64,
}

/// Single-vintage carbon certificate token.
#[odra::module]
pub struct CarbonVintage {
    /// Token name
    name: Var<String>,
    /// Token symbol
    symbol: Var<String>,
    /// Underlying precision
    decimals: Var<u8>,
    /// Vintage attributes, immutable after init
    attributes: Var<VintageAttributes>,
    /// Account allowed to mint (the tokenization bridge)
    minter: Var<Address>,
    /// Total supply
    total_supply: Var<U256>,
    /// Balance mapping: owner -> balance
    balances: Mapping<Address, U256>,
    /// Allowance mapping: owner -> spender -> amount
    allowances: Mapping<(Address, Address), U256>,
    /// Next retirement identifier
    next_retirement_id: Var<u64>,
    /// Cumulative amount retired
    total_retired: Var<U256>,
}

#[odra::module]
impl CarbonVintage {
    /// Initialize the certificate token. The deployer becomes the minter.
    pub fn init(
        &mut self,
        name: String,
        symbol: String,
        decimals: u8,
        attributes: VintageAttributes,
    ) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.attributes.set(attributes);
        self.minter.set(self.env().caller());
        self.total_supply.set(U256::zero());
        self.next_retirement_id.set(0);
        self.total_retired.set(U256::zero());
    }

    /// Token name
    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    /// Token symbol
    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    /// Underlying precision
    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    /// Vintage attributes. This contract carries a single vintage, so a
    /// `Some` sub-identifier is rejected.
    pub fn attributes(&self, sub_id: Option<U256>) -> VintageAttributes {
        self.ensure_known(sub_id);
        self.attributes
            .get_or_revert_with(VintageError::UnknownVintage)
    }

    /// Total certificates in circulation
    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    /// Cumulative amount retired through this contract
    pub fn total_retired(&self) -> U256 {
        self.total_retired.get_or_default()
    }

    /// Certificate balance of an address
    pub fn balance_of(&self, owner: Address, sub_id: Option<U256>) -> U256 {
        self.ensure_known(sub_id);
        self.balances.get(&owner).unwrap_or_default()
    }

    /// Remaining allowance for a spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    /// Mint new certificates. Restricted to the minter.
    pub fn mint(&mut self, to: Address, amount: U256) {
        let minter = self.minter.get_or_revert_with(VintageError::Unauthorized);
        if self.env().caller() != minter {
            self.env().revert(VintageError::Unauthorized);
        }
        if amount.is_zero() {
            self.env().revert(VintageError::InvalidAmount);
        }
        self.total_supply.set(self.total_supply() + amount);
        let balance = self.balances.get(&to).unwrap_or_default();
        self.balances.set(&to, balance + amount);
        self.env().emit_event(VintageMinted { to, amount });
    }

    /// Transfer certificates
    pub fn transfer(&mut self, to: Address, sub_id: Option<U256>, amount: U256) -> bool {
        self.ensure_known(sub_id);
        let caller = self.env().caller();
        self.transfer_internal(caller, to, amount);
        true
    }

    /// Approve a spender
    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.allowances.set(&(caller, spender), amount);
        true
    }

    /// Transfer certificates on behalf of another holder
    pub fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        sub_id: Option<U256>,
        amount: U256,
    ) -> bool {
        self.ensure_known(sub_id);
        let caller = self.env().caller();
        self.spend_allowance(from, caller, amount);
        self.transfer_internal(from, to, amount);
        true
    }

    /// Permanently destroy certificates without a retirement record.
    ///
    /// Used by pools to dispose of recalled or low-integrity credits.
    /// Callers may burn their own holdings; burning someone else's
    /// requires an allowance.
    pub fn burn(&mut self, owner: Address, sub_id: Option<U256>, amount: U256) {
        self.ensure_known(sub_id);
        let caller = self.env().caller();
        if caller != owner {
            self.spend_allowance(owner, caller, amount);
        }
        self.debit(owner, amount);
        self.env().emit_event(VintageBurned {
            account: owner,
            amount,
        });
    }

    /// Retire certificates and record a retirement identifier.
    ///
    /// Retirement permanently disposes of the certificates. Callers may
    /// retire their own holdings; retiring on behalf of another holder
    /// requires an allowance.
    pub fn retire_from(&mut self, owner: Address, sub_id: Option<U256>, amount: U256) -> u64 {
        self.ensure_known(sub_id);
        if amount.is_zero() {
            self.env().revert(VintageError::InvalidAmount);
        }
        let caller = self.env().caller();
        if caller != owner {
            self.spend_allowance(owner, caller, amount);
        }
        self.debit(owner, amount);
        self.total_retired.set(self.total_retired() + amount);

        let retirement_id = self.next_retirement_id.get_or_default();
        self.next_retirement_id.set(retirement_id + 1);

        self.env().emit_event(Retired {
            account: owner,
            amount,
            retirement_id,
        });
        retirement_id
    }

    // Internal helpers

    fn ensure_known(&self, sub_id: Option<U256>) {
        // Single-vintage contract: only the bare identifier exists.
        if sub_id.is_some() {
            self.env().revert(VintageError::UnknownVintage);
        }
    }

    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        let current = self.allowance(owner, spender);
        if current < amount {
            self.env().revert(VintageError::InsufficientAllowance);
        }
        self.allowances.set(&(owner, spender), current - amount);
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balances.get(&from).unwrap_or_default();
        if from_balance < amount {
            self.env().revert(VintageError::InsufficientBalance);
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balances.get(&to).unwrap_or_default();
        self.balances.set(&to, to_balance + amount);
    }

    fn debit(&mut self, owner: Address, amount: U256) {
        let balance = self.balances.get(&owner).unwrap_or_default();
        if balance < amount {
            self.env().revert(VintageError::InsufficientBalance);
        }
        self.balances.set(&owner, balance - amount);
        self.total_supply.set(self.total_supply() - amount);
    }
}

/// The pool's view of a vintage certificate contract.
#[odra::external_contract]
pub trait VintageToken {
    /// Certificate balance of an address
    fn balance_of(&self, owner: Address, sub_id: Option<U256>) -> U256;

    /// Transfer certificates
    fn transfer(&mut self, to: Address, sub_id: Option<U256>, amount: U256) -> bool;

    /// Transfer certificates on behalf of another holder
    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        sub_id: Option<U256>,
        amount: U256,
    ) -> bool;

    /// Permanently destroy certificates without a retirement record
    fn burn(&mut self, owner: Address, sub_id: Option<U256>, amount: U256);

    /// Retire certificates, returning the retirement identifier
    fn retire_from(&mut self, owner: Address, sub_id: Option<U256>, amount: U256) -> u64;

    /// Underlying precision
    fn decimals(&self) -> u8;

    /// Vintage attributes
    fn attributes(&self, sub_id: Option<U256>) -> VintageAttributes;
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::{Deployer, HostEnv};

    pub fn test_attributes() -> VintageAttributes {
        VintageAttributes {
            project_id: String::from("VCS-1234"),
            region: String::from("LATAM"),
            methodology: String::from("VM0015"),
            vintage_begin: 1_546_300_800, // 2019-01-01
        }
    }

    fn setup() -> (HostEnv, CarbonVintageHostRef) {
        let env = odra_test::env();
        let vintage = CarbonVintage::deploy(
            &env,
            CarbonVintageInitArgs {
                name: String::from("TCO2 VCS-1234 2019"),
                symbol: String::from("TCO2"),
                decimals: 18,
                attributes: test_attributes(),
            },
        );
        (env, vintage)
    }

    #[test]
    fn test_init_and_attributes() {
        let (_, vintage) = setup();
        assert_eq!(vintage.decimals(), 18);
        assert_eq!(vintage.total_supply(), U256::zero());
        let attrs = vintage.attributes(None);
        assert_eq!(attrs.project_id, "VCS-1234");
        // a single-vintage contract knows no sub-identifier
        assert!(vintage.try_attributes(Some(U256::one())).is_err());
    }

    #[test]
    fn test_mint_restricted_to_minter() {
        let (env, mut vintage) = setup();
        let user = env.get_account(1);

        vintage.mint(user, U256::from(100u64));
        assert_eq!(vintage.balance_of(user, None), U256::from(100u64));

        env.set_caller(user);
        assert!(vintage.try_mint(user, U256::from(1u64)).is_err());
    }

    #[test]
    fn test_retire_assigns_sequential_ids() {
        let (env, mut vintage) = setup();
        let user = env.get_account(1);
        vintage.mint(user, U256::from(100u64));

        env.set_caller(user);
        let first = vintage.retire_from(user, None, U256::from(40u64));
        let second = vintage.retire_from(user, None, U256::from(10u64));
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(vintage.total_retired(), U256::from(50u64));
        assert_eq!(vintage.total_supply(), U256::from(50u64));
    }

    #[test]
    fn test_third_party_retire_requires_allowance() {
        let (env, mut vintage) = setup();
        let holder = env.get_account(1);
        let operator = env.get_account(2);
        vintage.mint(holder, U256::from(100u64));

        env.set_caller(operator);
        assert!(vintage
            .try_retire_from(holder, None, U256::from(10u64))
            .is_err());

        env.set_caller(holder);
        vintage.approve(operator, U256::from(10u64));
        env.set_caller(operator);
        vintage.retire_from(holder, None, U256::from(10u64));
        assert_eq!(vintage.balance_of(holder, None), U256::from(90u64));
    }

    #[test]
    fn test_burn_reduces_supply() {
        let (env, mut vintage) = setup();
        let user = env.get_account(1);
        vintage.mint(user, U256::from(100u64));

        env.set_caller(user);
        vintage.burn(user, None, U256::from(30u64));
        assert_eq!(vintage.total_supply(), U256::from(70u64));
        // burning does not create a retirement record
        assert_eq!(vintage.total_retired(), U256::zero());
    }
}
