//! Pooled carbon accounting engine.
//!
//! The pool aggregates heterogeneous vintage certificates into one
//! fungible share token, enforces a supply cap, computes fees through a
//! pluggable policy, runs deterministic automatic redemption and
//! reconciles its ledger when assets are bridged to another execution
//! domain.

pub mod bridge;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod scores;

#[cfg(test)]
mod tests;

pub use bridge::ChannelMessenger;
pub use engine::CarbonPool;
pub use fees::{FeeDistribution, FixedFeeConfig, FlatFeeCalculator};
