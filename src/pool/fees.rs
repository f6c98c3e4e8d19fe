//! Fee policies for deposits and redemptions.
//!
//! A pool charges fees through one of two models selected by
//! configuration: a fixed basis-point policy evaluated in-contract, or an
//! external calculator contract that returns an explicit recipient/share
//! distribution. All fee computation is pure so quotes can be served
//! before a state-changing call.
use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::math::{PoolMath, SafeMath, BP_DENOMINATOR};
use crate::pool::errors::PoolError;

/// A computed fee as parallel recipient/amount arrays.
///
/// Zero length is the valid "no fee" result. The arrays must always have
/// equal length; a mismatch coming from an external calculator is a fatal
/// configuration error.
#[odra::odra_type]
pub struct FeeDistribution {
    /// Fee recipients
    pub recipients: Vec<Address>,
    /// Fee amount per recipient (pool share precision)
    pub amounts: Vec<U256>,
}

impl FeeDistribution {
    /// The empty "no fee" distribution.
    pub fn none() -> Self {
        Self {
            recipients: Vec::new(),
            amounts: Vec::new(),
        }
    }

    /// A distribution with a single recipient; empty when the amount is
    /// zero.
    pub fn single(recipient: Address, amount: U256) -> Self {
        if amount.is_zero() {
            return Self::none();
        }
        let mut recipients = Vec::new();
        recipients.push(recipient);
        let mut amounts = Vec::new();
        amounts.push(amount);
        Self { recipients, amounts }
    }

    /// Total fee across all recipients. External calculators control the
    /// amounts, so the sum is checked.
    pub fn total(&self) -> Result<U256, PoolError> {
        let mut sum = U256::zero();
        for amount in &self.amounts {
            sum = SafeMath::add(sum, *amount)?;
        }
        Ok(sum)
    }

    /// Whether the parallel arrays line up.
    pub fn is_well_formed(&self) -> bool {
        self.recipients.len() == self.amounts.len()
    }
}

/// Fixed basis-point fee policy.
///
/// Plain redemptions and redeem-with-retirement carry separate rates; the
/// retirement rate is typically the cheaper one to reward atomic
/// retirement. The collected fee is split between a receiver and a burn
/// address. Deposits are free unless a seeding threshold is configured,
/// in which case only the portion of a deposit that pushes the pooled
/// supply past the threshold is chargeable.
#[odra::odra_type]
pub struct FixedFeeConfig {
    /// Redemption fee rate in basis points
    pub redemption_fee_bp: u32,
    /// Redeem-and-retire fee rate in basis points
    pub retirement_fee_bp: u32,
    /// Fraction of the collected fee sent to the burn address, in basis
    /// points of the fee itself
    pub fee_burn_bp: u32,
    /// Receiver of the non-burned fee portion
    pub fee_receiver: Address,
    /// Address holding permanently dead shares
    pub burn_address: Address,
    /// Deposit fee rate in basis points, applied above the threshold
    pub deposit_fee_bp: u32,
    /// Pooled supply (share precision) below which deposits are free
    pub seeding_threshold: U256,
}

impl FixedFeeConfig {
    /// Validates all rates. Rates above 100% are rejected.
    pub fn validate(&self) -> Result<(), PoolError> {
        let max = BP_DENOMINATOR;
        if self.redemption_fee_bp as u64 > max
            || self.retirement_fee_bp as u64 > max
            || self.fee_burn_bp as u64 > max
            || self.deposit_fee_bp as u64 > max
        {
            return Err(PoolError::InvalidFeeConfig);
        }
        Ok(())
    }

    /// Fee on a redemption of `amount` pool shares.
    pub fn redemption_fee(&self, amount: U256, retiring: bool) -> Result<U256, PoolError> {
        let rate = if retiring {
            self.retirement_fee_bp
        } else {
            self.redemption_fee_bp
        };
        PoolMath::bp_fee(amount, rate)
    }

    /// Fee on a deposit of `amount` pool shares given the current pooled
    /// supply. Zero below the seeding threshold.
    pub fn deposit_fee(&self, current_supply: U256, amount: U256) -> Result<U256, PoolError> {
        if self.deposit_fee_bp == 0 {
            return Ok(U256::zero());
        }
        let chargeable =
            PoolMath::chargeable_above_threshold(current_supply, amount, self.seeding_threshold)?;
        PoolMath::bp_fee(chargeable, self.deposit_fee_bp)
    }

    /// Splits a collected fee into `(burned, to_receiver)` parts.
    pub fn burn_split(&self, fee: U256) -> Result<(U256, U256), PoolError> {
        let burned = PoolMath::bp_fee(fee, self.fee_burn_bp)?;
        Ok((burned, fee - burned))
    }

    /// The full redemption fee distribution for a batch total.
    pub fn redemption_distribution(
        &self,
        total_amount: U256,
        retiring: bool,
    ) -> Result<FeeDistribution, PoolError> {
        let fee = self.redemption_fee(total_amount, retiring)?;
        if fee.is_zero() {
            return Ok(FeeDistribution::none());
        }
        let (burned, to_receiver) = self.burn_split(fee)?;
        let mut dist = FeeDistribution::none();
        if !to_receiver.is_zero() {
            dist.recipients.push(self.fee_receiver);
            dist.amounts.push(to_receiver);
        }
        if !burned.is_zero() {
            dist.recipients.push(self.burn_address);
            dist.amounts.push(burned);
        }
        Ok(dist)
    }
}

/// External fee calculator interface.
///
/// The pool address is passed explicitly so a calculator can consult the
/// pool's current state (e.g. a seeding threshold against the pooled
/// supply). A failure inside the calculator fails the whole call; fee
/// computation is not optional once configured.
#[odra::external_contract]
pub trait FeeCalculator {
    /// Fee distribution for a single-asset deposit.
    fn calculate_deposit_fees(
        &self,
        pool: Address,
        token: Address,
        sub_id: Option<U256>,
        amount: U256,
    ) -> FeeDistribution;

    /// Fee distribution for a redemption batch.
    fn calculate_redemption_fees(
        &self,
        pool: Address,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        amounts: Vec<U256>,
    ) -> FeeDistribution;
}

/// The external calculator's view of a pool.
#[odra::external_contract]
pub trait PooledSupply {
    /// Current pooled supply in pool share precision.
    fn total_pooled(&self) -> U256;
}

/// Basis-point external fee calculator with an optional seeding
/// threshold. The reference implementation of [`FeeCalculator`].
#[odra::module]
pub struct FlatFeeCalculator {
    /// Calculator admin
    admin: Var<Address>,
    /// Recipient of all computed fees
    recipient: Var<Address>,
    /// Deposit fee rate in basis points
    deposit_fee_bp: Var<u32>,
    /// Redemption fee rate in basis points
    redemption_fee_bp: Var<u32>,
    /// Pooled supply below which no deposit fee applies
    seeding_threshold: Var<U256>,
}

#[odra::module]
impl FlatFeeCalculator {
    /// Initialize the calculator. The deployer becomes the admin.
    pub fn init(
        &mut self,
        recipient: Address,
        deposit_fee_bp: u32,
        redemption_fee_bp: u32,
        seeding_threshold: U256,
    ) {
        if deposit_fee_bp as u64 > BP_DENOMINATOR || redemption_fee_bp as u64 > BP_DENOMINATOR {
            self.env().revert(PoolError::InvalidFeeConfig);
        }
        self.admin.set(self.env().caller());
        self.recipient.set(recipient);
        self.deposit_fee_bp.set(deposit_fee_bp);
        self.redemption_fee_bp.set(redemption_fee_bp);
        self.seeding_threshold.set(seeding_threshold);
    }

    /// Fee distribution for a single-asset deposit. Free until the pool
    /// crosses the seeding threshold.
    pub fn calculate_deposit_fees(
        &self,
        pool: Address,
        _token: Address,
        _sub_id: Option<U256>,
        amount: U256,
    ) -> FeeDistribution {
        let rate = self.deposit_fee_bp.get_or_default();
        if rate == 0 {
            return FeeDistribution::none();
        }
        let supply = PooledSupplyContractRef::new(self.env(), pool).total_pooled();
        let threshold = self.seeding_threshold.get_or_default();
        let chargeable = PoolMath::chargeable_above_threshold(supply, amount, threshold)
            .unwrap_or_else(|e| self.env().revert(e));
        let fee = PoolMath::bp_fee(chargeable, rate).unwrap_or_else(|e| self.env().revert(e));
        let recipient = self.recipient.get_or_revert_with(PoolError::InvalidFeeConfig);
        FeeDistribution::single(recipient, fee)
    }

    /// Fee distribution for a redemption batch.
    pub fn calculate_redemption_fees(
        &self,
        _pool: Address,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        amounts: Vec<U256>,
    ) -> FeeDistribution {
        if tokens.len() != amounts.len() || tokens.len() != sub_ids.len() {
            self.env().revert(PoolError::LengthMismatch);
        }
        let mut total = U256::zero();
        for amount in &amounts {
            total = SafeMath::add(total, *amount).unwrap_or_else(|e| self.env().revert(e));
        }
        let rate = self.redemption_fee_bp.get_or_default();
        let fee = PoolMath::bp_fee(total, rate).unwrap_or_else(|e| self.env().revert(e));
        let recipient = self.recipient.get_or_revert_with(PoolError::InvalidFeeConfig);
        FeeDistribution::single(recipient, fee)
    }
}
