//! Event definitions for the pool engine.
use odra::prelude::*;
use odra::casper_types::{U256, U512};

/// Event emitted when a vintage is deposited into the pool.
#[odra::event]
pub struct Deposited {
    /// Depositor
    pub caller: Address,
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Accepted amount (underlying precision); may be below the request
    /// when the pool is near its cap
    pub amount: U256,
    /// Shares minted to the depositor, net of fees and score adjustment
    pub shares_minted: U256,
    /// Total fee charged (pool share precision)
    pub fee: U256,
}

/// Event emitted for each vintage released by a selective redemption.
#[odra::event]
pub struct Redeemed {
    /// Redeemer
    pub caller: Address,
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Underlying amount released
    pub amount: U256,
    /// Pool shares consumed for this asset (excluding fees)
    pub shares: U256,
    /// Whether the release was retired atomically
    pub retiring: bool,
}

/// Event emitted for each vintage retired through the pool.
#[odra::event]
pub struct RetiredFromPool {
    /// Redeemer the retirement is attributed to
    pub caller: Address,
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Underlying amount retired
    pub amount: U256,
    /// Identifier returned by the certificate contract
    pub retirement_id: u64,
}

/// Event emitted when a fee-exempt vintage is destroyed via the pool.
#[odra::event]
pub struct RedeemedAndBurned {
    /// Caller disposing of the vintage
    pub caller: Address,
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Underlying amount destroyed
    pub amount: U256,
    /// Pool shares burned
    pub shares: U256,
}

/// Event emitted for each vintage selected by automatic redemption.
#[odra::event]
pub struct AutoRedeemed {
    /// Redeemer
    pub caller: Address,
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Pool shares consumed from this asset
    pub shares: U256,
    /// Underlying amount released
    pub amount: U256,
}

/// Event emitted for each asset moved to a remote execution domain.
#[odra::event]
pub struct AssetBridged {
    /// Destination domain identifier
    pub destination_domain: u32,
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Underlying amount moved
    pub amount: U256,
    /// Remote pool receiving the assets
    pub remote_pool: Address,
    /// Share of the attached payment forwarded with this asset
    pub payment: U512,
}

/// Event emitted when a redemption fee share is paid out.
#[odra::event]
pub struct FeePaid {
    /// Fee recipient
    pub recipient: Address,
    /// Amount in pool shares
    pub amount: U256,
}

/// Event emitted when the supply cap changes.
#[odra::event]
pub struct SupplyCapUpdated {
    /// Previous cap (pool share precision)
    pub old_cap: U256,
    /// New cap
    pub new_cap: U256,
}

/// Event emitted when the redemption ranking is replaced.
#[odra::event]
pub struct RedemptionRankingUpdated {
    /// Number of ranked assets after the update
    pub length: u32,
}

/// Event emitted when a vintage score is set.
#[odra::event]
pub struct ScoreUpdated {
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// New score
    pub score: u8,
}

/// Event emitted when a caller fee exemption changes.
#[odra::event]
pub struct CallerFeeExemptionUpdated {
    /// Affected caller
    pub caller: Address,
    /// New exemption state
    pub exempt: bool,
}

/// Event emitted when an asset fee exemption changes.
#[odra::event]
pub struct AssetFeeExemptionUpdated {
    /// Certificate contract
    pub token: Address,
    /// New exemption state
    pub exempt: bool,
}

/// Event emitted when the fixed fee policy is replaced or cleared.
#[odra::event]
pub struct FixedFeePolicyUpdated {
    /// Whether a policy is configured after the update
    pub configured: bool,
}

/// Event emitted when the external fee calculator is replaced or cleared.
#[odra::event]
pub struct ExternalFeeCalculatorUpdated {
    /// Calculator address, if configured
    pub calculator: Option<Address>,
}

/// Event emitted when the messenger is replaced.
#[odra::event]
pub struct MessengerUpdated {
    /// New messenger address
    pub messenger: Address,
}

/// Event emitted when the pool is paused.
#[odra::event]
pub struct PoolPaused {
    /// Admin who paused
    pub by: Address,
}

/// Event emitted when the pool is unpaused.
#[odra::event]
pub struct PoolUnpaused {
    /// Admin who unpaused
    pub by: Address,
}
