//! Error definitions for the pool engine.
use odra::prelude::*;

/// Errors raised by the carbon pool.
#[odra::odra_error]
pub enum PoolError {
    /// Pool is paused
    Paused = 1,

    /// Caller is not the pool admin
    Unauthorized = 2,

    /// Reentrant call rejected
    Locked = 3,

    /// No remaining deposit capacity
    PoolFull = 4,

    /// Ranking exhausted before the requested amount was covered
    InsufficientPooledSupply = 5,

    /// The pool's own share reserve cannot cover the adjusted burn
    InsufficientReserve = 6,

    /// The eligibility filter rejected the vintage
    AssetIneligible = 7,

    /// The vintage has no score configured
    ScoreUnset = 8,

    /// The score is frozen after the first deposit
    ScoreFrozen = 9,

    /// Score outside [1, 100]
    InvalidScore = 10,

    /// Score adjustment is not enabled for this pool
    ScoringDisabled = 11,

    /// Computed fee exceeds the caller's bound
    FeeExceedsMax = 12,

    /// A fee policy is configured, so a nonzero max fee is mandatory
    MaxFeeRequired = 13,

    /// Fee would consume the entire deposit
    FeeExceedsAmount = 14,

    /// Parallel input arrays differ in length
    LengthMismatch = 15,

    /// Zero amount or empty batch
    ZeroAmount = 16,

    /// Cap below the currently pooled supply
    InvalidCap = 17,

    /// Underlying precision exceeds the pool precision
    UnsupportedPrecision = 18,

    /// No remote pool registered for the destination domain
    NoRemotePool = 19,

    /// No messenger configured
    MessengerNotConfigured = 20,

    /// No eligibility filter configured
    FilterNotConfigured = 21,

    /// The destroy path requires a fee-exempt asset
    AssetNotFeeExempt = 22,

    /// Operation not supported under the configured fee model
    UnsupportedOperation = 23,

    /// Fee configuration rejected (rate above 100%)
    InvalidFeeConfig = 24,

    /// External calculator returned mismatched recipient/share arrays
    MalformedFeeDistribution = 25,

    /// Overflow error
    Overflow = 26,

    /// Underflow error
    Underflow = 27,

    /// Division by zero
    DivisionByZero = 28,

    /// Underlying certificate transfer failed
    TransferFailed = 29,
}
