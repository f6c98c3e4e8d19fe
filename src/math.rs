//! Arithmetic helpers for the pool engine.
//!
//! Everything here is pure and returns `Result`; the contract layer maps
//! errors to reverts. Pool shares are denominated at [`POOL_DECIMALS`]
//! regardless of the precision of the underlying certificate, and the
//! conversion factor between the two is validated rather than assumed.
use odra::casper_types::{U256, U512};
use crate::pool::errors::PoolError;

/// Precision of the pool share token.
pub const POOL_DECIMALS: u8 = 18;

/// Denominator for basis-point fee rates (100% = 10_000 bp).
pub const BP_DENOMINATOR: u64 = 10_000;

/// Upper bound of the vintage quality score. A score of 0 means "unset".
pub const MAX_SCORE: u8 = 100;

/// Denominator of the score split (score 100 = full 1:1 exchange).
pub const SCORE_DENOMINATOR: u64 = 100;

/// Safe math operations for U256
pub struct SafeMath;

impl SafeMath {
    /// Safe addition with overflow check
    pub fn add(a: U256, b: U256) -> Result<U256, PoolError> {
        a.checked_add(b).ok_or(PoolError::Overflow)
    }

    /// Safe subtraction with underflow check
    pub fn sub(a: U256, b: U256) -> Result<U256, PoolError> {
        a.checked_sub(b).ok_or(PoolError::Underflow)
    }

    /// Safe multiplication with overflow check
    pub fn mul(a: U256, b: U256) -> Result<U256, PoolError> {
        a.checked_mul(b).ok_or(PoolError::Overflow)
    }

    /// Safe division with zero check
    pub fn div(a: U256, b: U256) -> Result<U256, PoolError> {
        if b.is_zero() {
            return Err(PoolError::DivisionByZero);
        }
        Ok(a / b)
    }

    /// Returns the minimum of two U256 values
    pub fn min(a: U256, b: U256) -> U256 {
        if a < b { a } else { b }
    }

    /// Safe addition for U512 amounts (native token payments)
    pub fn add_wide(a: U512, b: U512) -> Result<U512, PoolError> {
        a.checked_add(b).ok_or(PoolError::Overflow)
    }
}

/// Precision, fee and score calculations for the pool.
pub struct PoolMath;

impl PoolMath {
    /// Conversion factor from an underlying precision to pool shares.
    ///
    /// An underlying with more decimals than the pool itself cannot be
    /// represented exactly and is rejected.
    pub fn scale_factor(decimals: u8) -> Result<U256, PoolError> {
        if decimals > POOL_DECIMALS {
            return Err(PoolError::UnsupportedPrecision);
        }
        let exp = (POOL_DECIMALS - decimals) as u64;
        Ok(U256::from(10u64).pow(U256::from(exp)))
    }

    /// Converts an underlying amount to pool share units.
    pub fn to_pool_units(amount: U256, scale: U256) -> Result<U256, PoolError> {
        SafeMath::mul(amount, scale)
    }

    /// Converts a pool share amount back to underlying units, rounding
    /// down. The sub-unit remainder is the documented precision loss.
    pub fn from_pool_units(amount: U256, scale: U256) -> Result<U256, PoolError> {
        SafeMath::div(amount, scale)
    }

    /// Basis-point fee on an amount, rounded down.
    pub fn bp_fee(amount: U256, rate_bp: u32) -> Result<U256, PoolError> {
        if rate_bp as u64 > BP_DENOMINATOR {
            return Err(PoolError::InvalidFeeConfig);
        }
        let raw = SafeMath::mul(amount, U256::from(rate_bp))?;
        SafeMath::div(raw, U256::from(BP_DENOMINATOR))
    }

    /// Splits a minted/burned total between the caller and the pool's
    /// own reserve according to the vintage score.
    ///
    /// Returns `(caller_part, reserve_part)` with
    /// `caller_part = floor(total * score / 100)`.
    pub fn score_split(total: U256, score: u8) -> Result<(U256, U256), PoolError> {
        if score == 0 || score > MAX_SCORE {
            return Err(PoolError::InvalidScore);
        }
        let caller_part = SafeMath::div(
            SafeMath::mul(total, U256::from(score))?,
            U256::from(SCORE_DENOMINATOR),
        )?;
        let reserve_part = SafeMath::sub(total, caller_part)?;
        Ok((caller_part, reserve_part))
    }

    /// Portion of a deposit that lies above the seeding threshold.
    ///
    /// Deposits are free until the pooled supply crosses `threshold`;
    /// only the excess over the threshold is chargeable.
    pub fn chargeable_above_threshold(
        current_supply: U256,
        amount: U256,
        threshold: U256,
    ) -> Result<U256, PoolError> {
        let after = SafeMath::add(current_supply, amount)?;
        if after <= threshold {
            return Ok(U256::zero());
        }
        let floor = if current_supply > threshold {
            current_supply
        } else {
            threshold
        };
        SafeMath::sub(after, floor)
    }

    /// Per-asset share of an attached bridging payment.
    ///
    /// Integer division; the remainder is forfeited, which is the
    /// documented behavior of the bridging path.
    pub fn split_payment(total: U512, parts: u64) -> Result<U512, PoolError> {
        if parts == 0 {
            return Err(PoolError::DivisionByZero);
        }
        Ok(total / U512::from(parts))
    }
}
