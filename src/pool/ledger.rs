//! Internal supply ledger of a pool.
//!
//! Tracks the total pooled supply and, per underlying project, the supply
//! contributed by that project's vintages. Both figures are kept in pool
//! share precision and are mutated together, so the conservation
//! invariant `total == sum(per_project)` holds structurally: there is no
//! other mutation path.
use odra::prelude::*;
use odra::casper_types::U256;
use crate::pool::errors::PoolError;

/// Supply ledger submodule. Only the owning pool mutates it, and only
/// on deposit (+), redemption (−) and bridge-out (−).
#[odra::module]
pub struct SupplyLedger {
    /// Total pooled supply (pool share precision)
    total: Var<U256>,
    /// Pooled supply per project identifier
    per_project: Mapping<String, U256>,
}

#[odra::module]
impl SupplyLedger {
    /// Record a deposit for a project.
    pub fn credit(&mut self, project_id: String, amount: U256) {
        let total = self.total.get_or_default();
        let new_total = total
            .checked_add(amount)
            .unwrap_or_else(|| self.env().revert(PoolError::Overflow));
        let project = self.per_project.get(&project_id).unwrap_or_default();
        // per-project cannot overflow if the total did not
        self.per_project.set(&project_id, project + amount);
        self.total.set(new_total);
    }

    /// Record a redemption or bridge-out for a project. Reverts rather
    /// than letting either figure go negative.
    pub fn debit(&mut self, project_id: String, amount: U256) {
        let total = self.total.get_or_default();
        let project = self.per_project.get(&project_id).unwrap_or_default();
        if project < amount || total < amount {
            self.env().revert(PoolError::Underflow);
        }
        self.per_project.set(&project_id, project - amount);
        self.total.set(total - amount);
    }

    /// Total pooled supply.
    pub fn total_pooled(&self) -> U256 {
        self.total.get_or_default()
    }

    /// Pooled supply contributed by one project.
    pub fn project_pooled(&self, project_id: String) -> U256 {
        self.per_project.get(&project_id).unwrap_or_default()
    }
}
