//! Event definitions for the token-level contracts.
use odra::prelude::*;
use odra::casper_types::U256;

/// Event emitted when pool shares are transferred.
#[odra::event]
pub struct Transfer {
    /// From address
    pub from: Address,
    /// To address
    pub to: Address,
    /// Amount transferred
    pub value: U256,
}

/// Event emitted when a share allowance is granted.
#[odra::event]
pub struct Approval {
    /// Owner address
    pub owner: Address,
    /// Spender address
    pub spender: Address,
    /// Amount approved
    pub value: U256,
}

/// Event emitted when new vintage certificates are minted.
#[odra::event]
pub struct VintageMinted {
    /// Recipient of the certificates
    pub to: Address,
    /// Amount minted (underlying precision)
    pub amount: U256,
}

/// Event emitted when vintage certificates are permanently destroyed.
#[odra::event]
pub struct VintageBurned {
    /// Holder the certificates were burned from
    pub account: Address,
    /// Amount burned (underlying precision)
    pub amount: U256,
}

/// Event emitted when vintage certificates are retired.
///
/// Retirement is a terminal disposal that yields a retirement identifier
/// usable for offset claims; the identifier is also returned to the caller.
#[odra::event]
pub struct Retired {
    /// Holder the certificates were retired from
    pub account: Address,
    /// Amount retired (underlying precision)
    pub amount: U256,
    /// Identifier of this retirement
    pub retirement_id: u64,
}
