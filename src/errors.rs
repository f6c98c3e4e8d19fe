//! Error definitions shared by the token-level contracts.
//!
//! Pool engine errors live in `pool::errors`; the enums here cover the
//! fungible share token, the vintage certificate token and the
//! eligibility filter. Code ranges are kept disjoint so host-side
//! failures are attributable to a contract family.
use odra::prelude::*;

/// Errors raised by the pool share token.
#[odra::odra_error]
pub enum TokenError {
    /// Insufficient allowance for transfer
    InsufficientAllowance = 100,

    /// Insufficient balance for operation
    InsufficientBalance = 101,
}

/// Errors raised by the vintage certificate token.
#[odra::odra_error]
pub enum VintageError {
    /// Caller is not allowed to perform this action
    Unauthorized = 200,

    /// Holder balance is too small for the requested amount
    InsufficientBalance = 201,

    /// The contract does not carry the requested sub-identifier
    UnknownVintage = 202,

    /// Zero or otherwise unusable amount
    InvalidAmount = 203,

    /// Allowance is too small for a third-party operation
    InsufficientAllowance = 204,
}

/// Errors raised by the attribute-based eligibility filter.
#[odra::odra_error]
pub enum FilterError {
    /// Caller is not the filter admin
    Unauthorized = 300,
}
