//! Vintage quality scores for score-adjusted pools.
//!
//! A score in [1, 100] controls what fraction of a deposit or redemption
//! exchanges 1:1 against pool shares; the remainder is absorbed by the
//! pool's own reserve. A score of 0 is reserved to mean "unset" and makes
//! deposits and redemptions of that vintage fail distinctly. Once a
//! vintage has been deposited, its score is frozen so the exchange rate
//! existing depositors transacted at cannot be changed retroactively.
use odra::prelude::*;
use crate::math::MAX_SCORE;
use crate::pool::errors::PoolError;
use crate::vintage::AssetId;

/// Score table submodule. Only the owning pool mutates it.
#[odra::module]
pub struct ScoreTable {
    /// Score per vintage; absent means unset
    scores: Mapping<AssetId, u8>,
    /// Whether a vintage has ever been deposited (freezes the score)
    deposited: Mapping<AssetId, bool>,
}

#[odra::module]
impl ScoreTable {
    /// Set a vintage score. Rejects out-of-range values and frozen
    /// vintages.
    pub fn set(&mut self, asset: AssetId, score: u8) {
        if score == 0 || score > MAX_SCORE {
            self.env().revert(PoolError::InvalidScore);
        }
        if self.deposited.get(&asset).unwrap_or(false) {
            self.env().revert(PoolError::ScoreFrozen);
        }
        self.scores.set(&asset, score);
    }

    /// Score of a vintage; 0 when unset.
    pub fn score_of(&self, asset: AssetId) -> u8 {
        self.scores.get(&asset).unwrap_or_default()
    }

    /// Freeze the score of a vintage after its first deposit.
    pub fn mark_deposited(&mut self, asset: AssetId) {
        self.deposited.set(&asset, true);
    }

    /// Whether a vintage has been deposited at least once.
    pub fn is_deposited(&self, asset: AssetId) -> bool {
        self.deposited.get(&asset).unwrap_or(false)
    }
}
