//! Carbon pool contract.
//!
//! Aggregates heterogeneous vintage certificates into one fungible share
//! token at pool precision. Deposits are screened by an eligibility
//! filter and capped by the supply cap; redemptions come in selective
//! (fee-bearing), automatic (greedy over the owner-curated ranking,
//! fee-free), retiring and destroying flavors. An internal supply ledger
//! partitions the pooled amount by project and is reconciled when assets
//! are bridged to a remote execution domain.
use odra::prelude::*;
use odra::casper_types::{U256, U512};
use odra::ContractRef;
use crate::filter::EligibilityFilterContractRef;
use crate::math::{PoolMath, SafeMath};
use crate::pool::bridge::MessengerContractRef;
use crate::pool::errors::PoolError;
use crate::pool::events::*;
use crate::pool::fees::{FeeCalculatorContractRef, FeeDistribution, FixedFeeConfig};
use crate::pool::ledger::SupplyLedger;
use crate::pool::scores::ScoreTable;
use crate::token::PoolShareToken;
use crate::vintage::{AssetId, VintageTokenContractRef};

/// One entry of an automatic redemption result.
#[odra::odra_type]
pub struct RedeemedAsset {
    /// Certificate contract
    pub token: Address,
    /// Vintage discriminator, if any
    pub sub_id: Option<U256>,
    /// Pool shares consumed from this asset
    pub shares: U256,
    /// Underlying amount released
    pub amount: U256,
}

/// Carbon pool contract.
#[odra::module]
pub struct CarbonPool {
    /// Fungible share token
    share_token: SubModule<PoolShareToken>,
    /// Total and per-project pooled supply
    ledger: SubModule<SupplyLedger>,
    /// Vintage quality scores (score-adjusted pools only)
    scores: SubModule<ScoreTable>,
    /// Pool admin
    admin: Var<Address>,
    /// Pause flag; suspends deposits, redemptions and bridging
    paused: Var<bool>,
    /// Reentrancy lock
    locked: Var<bool>,
    /// Supply cap in pool share precision
    supply_cap: Var<U256>,
    /// Eligibility filter contract
    filter: Var<Address>,
    /// Fixed fee policy, if configured
    fixed_fees: Var<Option<FixedFeeConfig>>,
    /// External fee calculator, if configured (takes precedence)
    fee_calculator: Var<Option<Address>>,
    /// Cross-domain messenger
    messenger: Var<Address>,
    /// Callers whose fees are forced to zero
    fee_exempt_callers: Mapping<Address, bool>,
    /// Assets admitted to the fee-exempt destroy path
    fee_exempt_assets: Mapping<Address, bool>,
    /// Owner-curated ranking driving automatic redemption
    ranking: Var<Vec<AssetId>>,
    /// Whether deposits/redemptions are score-adjusted
    score_adjusted: Var<bool>,
    /// Whether fee-exempt callers must still pass a nonzero max fee
    exempt_max_fee_required: Var<bool>,
}

#[odra::module]
impl CarbonPool {
    /// Initialize the pool. The deployer becomes the admin.
    pub fn init(
        &mut self,
        name: String,
        symbol: String,
        supply_cap: U256,
        filter: Address,
        score_adjusted: bool,
    ) {
        self.share_token.init(name, symbol);
        self.admin.set(self.env().caller());
        self.paused.set(false);
        self.locked.set(false);
        self.supply_cap.set(supply_cap);
        self.filter.set(filter);
        self.fixed_fees.set(None);
        self.fee_calculator.set(None);
        self.ranking.set(Vec::new());
        self.score_adjusted.set(score_adjusted);
        self.exempt_max_fee_required.set(true);
    }

    // ============ Deposit ============

    /// Deposit a vintage and mint pool shares.
    ///
    /// `amount` is in underlying precision; the request is clamped to the
    /// remaining capacity (capping is not an error, a full pool is).
    /// `max_fee` bounds the deposit fee in pool share precision; passing
    /// 0 is only accepted when no fee is actually charged.
    ///
    /// Returns the shares minted to the caller, net of capping, fees and
    /// score adjustment.
    pub fn deposit(
        &mut self,
        token: Address,
        sub_id: Option<U256>,
        amount: U256,
        max_fee: U256,
    ) -> U256 {
        self.ensure_not_paused();
        self.lock();
        let caller = self.env().caller();
        if amount.is_zero() {
            self.env().revert(PoolError::ZeroAmount);
        }
        self.require_eligible(token, sub_id);

        let scale = self.asset_scale(token);
        let cap = self.supply_cap.get_or_default();
        let total = self.ledger.total_pooled();
        let remaining = self.checked(SafeMath::sub(cap, total));
        let remaining_underlying = self.checked(PoolMath::from_pool_units(remaining, scale));
        if remaining_underlying.is_zero() {
            self.env().revert(PoolError::PoolFull);
        }
        let accepted = SafeMath::min(amount, remaining_underlying);
        let accepted_shares = self.checked(PoolMath::to_pool_units(accepted, scale));

        // score split: the non-1:1 remainder goes to the pool's own reserve
        let asset = AssetId { token, sub_id };
        let (caller_part, reserve_part) = if self.score_adjusted.get_or_default() {
            let score = self.scores.score_of(asset.clone());
            if score == 0 {
                self.env().revert(PoolError::ScoreUnset);
            }
            self.checked(PoolMath::score_split(accepted_shares, score))
        } else {
            (accepted_shares, U256::zero())
        };

        let dist = self.deposit_fee_breakdown(caller, token, sub_id, accepted_shares);
        let fee = self.checked(dist.total());
        if !fee.is_zero() {
            if max_fee.is_zero() {
                self.env().revert(PoolError::MaxFeeRequired);
            }
            if fee > max_fee {
                self.env().revert(PoolError::FeeExceedsMax);
            }
        }
        if fee > caller_part {
            self.env().revert(PoolError::FeeExceedsAmount);
        }
        let minted = caller_part - fee;

        // effects
        let project = self.project_of(token, sub_id);
        self.ledger.credit(project, accepted_shares);
        if self.score_adjusted.get_or_default() {
            self.scores.mark_deposited(asset);
        }
        self.share_token.mint(caller, minted);
        for i in 0..dist.recipients.len() {
            self.share_token.mint(dist.recipients[i], dist.amounts[i]);
            self.env().emit_event(FeePaid {
                recipient: dist.recipients[i],
                amount: dist.amounts[i],
            });
        }
        if !reserve_part.is_zero() {
            let self_addr = self.env().self_address();
            self.share_token.mint(self_addr, reserve_part);
        }

        // interaction last: pull the certificates into custody
        let self_addr = self.env().self_address();
        let mut vintage = VintageTokenContractRef::new(self.env(), token);
        if !vintage.transfer_from(caller, self_addr, sub_id, accepted) {
            self.env().revert(PoolError::TransferFailed);
        }

        self.env().emit_event(Deposited {
            caller,
            token,
            sub_id,
            amount: accepted,
            shares_minted: minted,
            fee,
        });
        self.unlock();
        minted
    }

    // ============ Selective redemption ============

    /// Redeem by pool shares spent. `amounts[i]` is the share amount the
    /// caller is willing to spend on asset `i`; the fee is subtracted and
    /// the remainder released. Returns the underlying released per asset
    /// in input order. The batch is all-or-nothing.
    pub fn redeem_in(
        &mut self,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        amounts: Vec<U256>,
        max_fee: U256,
    ) -> Vec<U256> {
        self.ensure_not_paused();
        self.lock();
        let caller = self.env().caller();
        self.check_batch(&tokens, &sub_ids, &amounts);
        for i in 0..tokens.len() {
            self.require_eligible(tokens[i], sub_ids[i]);
        }

        let (per_asset_fees, dist) =
            self.redemption_fee_breakdown(caller, &tokens, &sub_ids, &amounts, false);
        let fee_total = self.checked(dist.total());
        self.enforce_redemption_max_fee(caller, fee_total, max_fee);

        let mut released = Vec::new();
        for i in 0..tokens.len() {
            let net = amounts[i]
                .checked_sub(per_asset_fees[i])
                .unwrap_or_else(|| self.env().revert(PoolError::FeeExceedsAmount));
            let scale = self.asset_scale(tokens[i]);
            let underlying = self.checked(PoolMath::from_pool_units(net, scale));
            if underlying.is_zero() {
                self.env().revert(PoolError::ZeroAmount);
            }
            let shares = self.checked(PoolMath::to_pool_units(underlying, scale));
            self.burn_for_release(caller, tokens[i], sub_ids[i], shares);

            let mut vintage = VintageTokenContractRef::new(self.env(), tokens[i]);
            if !vintage.transfer(caller, sub_ids[i], underlying) {
                self.env().revert(PoolError::TransferFailed);
            }
            self.env().emit_event(Redeemed {
                caller,
                token: tokens[i],
                sub_id: sub_ids[i],
                amount: underlying,
                shares,
                retiring: false,
            });
            released.push(underlying);
        }
        self.collect_redemption_fee(caller, &dist);
        self.unlock();
        released
    }

    /// Redeem by underlying desired. `amounts[i]` is the underlying
    /// amount to release from asset `i`; the fee is charged on top.
    /// Returns the total pool shares spent including fees.
    pub fn redeem_out(
        &mut self,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        amounts: Vec<U256>,
        max_fee: U256,
    ) -> U256 {
        self.ensure_not_paused();
        self.lock();
        let caller = self.env().caller();
        let spent = self.redeem_out_internal(caller, &tokens, &sub_ids, &amounts, max_fee, false);
        self.unlock();
        spent
    }

    /// Redeem by underlying desired and retire each released amount
    /// atomically, at the retirement fee rate. Returns the retirement
    /// identifiers in input order.
    pub fn redeem_and_retire(
        &mut self,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        amounts: Vec<U256>,
        max_fee: U256,
    ) -> Vec<u64> {
        self.ensure_not_paused();
        self.lock();
        let caller = self.env().caller();
        self.redeem_out_internal(caller, &tokens, &sub_ids, &amounts, max_fee, true);

        let self_addr = self.env().self_address();
        let mut retirement_ids = Vec::new();
        for i in 0..tokens.len() {
            let mut vintage = VintageTokenContractRef::new(self.env(), tokens[i]);
            let retirement_id = vintage.retire_from(self_addr, sub_ids[i], amounts[i]);
            self.env().emit_event(RetiredFromPool {
                caller,
                token: tokens[i],
                sub_id: sub_ids[i],
                amount: amounts[i],
                retirement_id,
            });
            retirement_ids.push(retirement_id);
        }
        self.unlock();
        retirement_ids
    }

    /// Destroy a fee-exempt vintage out of pool custody, permanently and
    /// irrecoverably. No fee, no retirement record. Used to dispose of
    /// credits the operator has deemed undesirable.
    pub fn redeem_and_burn(&mut self, token: Address, sub_id: Option<U256>, amount: U256) {
        self.ensure_not_paused();
        self.lock();
        let caller = self.env().caller();
        if !self.fee_exempt_assets.get(&token).unwrap_or(false) {
            self.env().revert(PoolError::AssetNotFeeExempt);
        }
        if amount.is_zero() {
            self.env().revert(PoolError::ZeroAmount);
        }
        let scale = self.asset_scale(token);
        let shares = self.checked(PoolMath::to_pool_units(amount, scale));
        self.burn_for_release(caller, token, sub_id, shares);

        let self_addr = self.env().self_address();
        let mut vintage = VintageTokenContractRef::new(self.env(), token);
        vintage.burn(self_addr, sub_id, amount);

        self.env().emit_event(RedeemedAndBurned {
            caller,
            token,
            sub_id,
            amount,
            shares,
        });
        self.unlock();
    }

    // ============ Automatic redemption ============

    /// Redeem `amount` pool shares against the ranking, fee-free.
    ///
    /// A single deterministic left-to-right greedy pass: each ranked
    /// asset with a nonzero pool balance contributes
    /// `min(remaining, balance)`, rounded down to whole underlying units.
    /// Assets with zero balance are skipped and never reported. If the
    /// ranking is exhausted first, the whole call fails and nothing is
    /// redeemed.
    pub fn redeem_auto(&mut self, amount: U256) -> Vec<RedeemedAsset> {
        self.ensure_not_paused();
        self.lock();
        let caller = self.env().caller();
        if amount.is_zero() {
            self.env().revert(PoolError::ZeroAmount);
        }
        let self_addr = self.env().self_address();
        let ranking = self.ranking.get_or_default();

        let mut remaining = amount;
        let mut selected: Vec<RedeemedAsset> = Vec::new();
        for asset in ranking {
            if remaining.is_zero() {
                break;
            }
            let scale = self.asset_scale(asset.token);
            let vintage_view = VintageTokenContractRef::new(self.env(), asset.token);
            let balance = vintage_view.balance_of(self_addr, asset.sub_id);
            if balance.is_zero() {
                continue;
            }
            let balance_shares = self.checked(PoolMath::to_pool_units(balance, scale));
            let take = SafeMath::min(remaining, balance_shares);
            let underlying = self.checked(PoolMath::from_pool_units(take, scale));
            if underlying.is_zero() {
                // remaining is below one underlying unit of this asset
                continue;
            }
            let shares = self.checked(PoolMath::to_pool_units(underlying, scale));

            self.burn_for_release(caller, asset.token, asset.sub_id, shares);
            let mut vintage = VintageTokenContractRef::new(self.env(), asset.token);
            if !vintage.transfer(caller, asset.sub_id, underlying) {
                self.env().revert(PoolError::TransferFailed);
            }
            remaining -= shares;
            self.env().emit_event(AutoRedeemed {
                caller,
                token: asset.token,
                sub_id: asset.sub_id,
                shares,
                amount: underlying,
            });
            selected.push(RedeemedAsset {
                token: asset.token,
                sub_id: asset.sub_id,
                shares,
                amount: underlying,
            });
        }
        if !remaining.is_zero() {
            self.env().revert(PoolError::InsufficientPooledSupply);
        }
        self.unlock();
        selected
    }

    // ============ Quoting ============

    /// Eligibility of a vintage, with the filter's verbatim rejection
    /// reason.
    pub fn check_eligible(&self, token: Address, sub_id: Option<U256>) -> Option<String> {
        let filter = self
            .filter
            .get_or_revert_with(PoolError::FilterNotConfigured);
        EligibilityFilterContractRef::new(self.env(), filter).check_eligible(token, sub_id)
    }

    /// Quote the fee for depositing `amount` (underlying precision).
    pub fn quote_deposit_fee(
        &self,
        token: Address,
        sub_id: Option<U256>,
        amount: U256,
    ) -> FeeDistribution {
        let caller = self.env().caller();
        let scale = self.asset_scale(token);
        let shares = self.checked(PoolMath::to_pool_units(amount, scale));
        self.deposit_fee_breakdown(caller, token, sub_id, shares)
    }

    /// Quote the fee for a selective redemption. `amounts` are in pool
    /// share precision.
    pub fn quote_redemption_fee(
        &self,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        amounts: Vec<U256>,
        retiring: bool,
    ) -> FeeDistribution {
        let caller = self.env().caller();
        self.check_batch(&tokens, &sub_ids, &amounts);
        let (_, dist) =
            self.redemption_fee_breakdown(caller, &tokens, &sub_ids, &amounts, retiring);
        dist
    }

    /// Quote the total messenger payment for bridging a batch.
    pub fn quote_bridge_fee(
        &self,
        destination_domain: u32,
        tokens: Vec<Address>,
        amounts: Vec<U256>,
    ) -> U512 {
        if tokens.len() != amounts.len() {
            self.env().revert(PoolError::LengthMismatch);
        }
        let messenger = self
            .messenger
            .get_or_revert_with(PoolError::MessengerNotConfigured);
        let messenger_ref = MessengerContractRef::new(self.env(), messenger);
        let mut total = U512::zero();
        for i in 0..tokens.len() {
            let fee = messenger_ref.quote_transfer_fee(destination_domain, tokens[i], amounts[i]);
            total = self.checked(SafeMath::add_wide(total, fee));
        }
        total
    }

    // ============ Bridging ============

    /// Move pooled assets to a remote execution domain.
    ///
    /// The attached payment is split evenly across the assets by integer
    /// division; the remainder is not refunded. For each asset the ledger
    /// is decremented strictly before dispatch, and any failure reverts
    /// the whole batch. Admin-only.
    #[odra(payable)]
    pub fn bridge_assets(
        &mut self,
        destination_domain: u32,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        amounts: Vec<U256>,
    ) {
        self.ensure_not_paused();
        self.only_admin();
        self.lock();
        self.check_batch(&tokens, &sub_ids, &amounts);

        let messenger = self
            .messenger
            .get_or_revert_with(PoolError::MessengerNotConfigured);
        let mut messenger_ref = MessengerContractRef::new(self.env(), messenger);

        let attached = self.env().attached_value();
        let payment_share = self
            .checked(PoolMath::split_payment(attached, tokens.len() as u64));

        for i in 0..tokens.len() {
            if amounts[i].is_zero() {
                self.env().revert(PoolError::ZeroAmount);
            }
            let remote_pool = match messenger_ref.remote_pool_address(tokens[i], destination_domain)
            {
                Some(addr) => addr,
                None => self.env().revert(PoolError::NoRemotePool),
            };
            let scale = self.asset_scale(tokens[i]);
            let shares = self.checked(PoolMath::to_pool_units(amounts[i], scale));
            let project = self.project_of(tokens[i], sub_ids[i]);

            // ledger first, then the hand-off; a failed dispatch reverts both
            self.ledger.debit(project, shares);
            let mut vintage = VintageTokenContractRef::new(self.env(), tokens[i]);
            if !vintage.transfer(messenger, sub_ids[i], amounts[i]) {
                self.env().revert(PoolError::TransferFailed);
            }
            if !payment_share.is_zero() {
                self.env().transfer_tokens(&messenger, &payment_share);
            }
            messenger_ref.dispatch_transfer(
                destination_domain,
                tokens[i],
                sub_ids[i],
                amounts[i],
                remote_pool,
                payment_share,
            );
            self.env().emit_event(AssetBridged {
                destination_domain,
                token: tokens[i],
                sub_id: sub_ids[i],
                amount: amounts[i],
                remote_pool,
                payment: payment_share,
            });
        }
        self.unlock();
    }

    // ============ Views ============

    /// Total pooled supply (pool share precision)
    pub fn total_pooled(&self) -> U256 {
        self.ledger.total_pooled()
    }

    /// Pooled supply contributed by one project
    pub fn project_pooled(&self, project_id: String) -> U256 {
        self.ledger.project_pooled(project_id)
    }

    /// Supply cap (pool share precision)
    pub fn supply_cap(&self) -> U256 {
        self.supply_cap.get_or_default()
    }

    /// Remaining deposit capacity (pool share precision)
    pub fn remaining_capacity(&self) -> U256 {
        let cap = self.supply_cap.get_or_default();
        let total = self.ledger.total_pooled();
        self.checked(SafeMath::sub(cap, total))
    }

    /// Current redemption ranking
    pub fn redemption_ranking(&self) -> Vec<AssetId> {
        self.ranking.get_or_default()
    }

    /// Score of a vintage; 0 when unset
    pub fn score_of(&self, token: Address, sub_id: Option<U256>) -> u8 {
        self.scores.score_of(AssetId { token, sub_id })
    }

    /// Whether a vintage's score is frozen by a prior deposit
    pub fn is_vintage_deposited(&self, token: Address, sub_id: Option<U256>) -> bool {
        self.scores.is_deposited(AssetId { token, sub_id })
    }

    /// Whether the pool is score-adjusted
    pub fn is_score_adjusted(&self) -> bool {
        self.score_adjusted.get_or_default()
    }

    /// Whether a caller is exempt from fees
    pub fn is_caller_fee_exempt(&self, caller: Address) -> bool {
        self.fee_exempt_callers.get(&caller).unwrap_or(false)
    }

    /// Whether an asset is admitted to the destroy path
    pub fn is_asset_fee_exempt(&self, token: Address) -> bool {
        self.fee_exempt_assets.get(&token).unwrap_or(false)
    }

    /// Configured fixed fee policy, if any
    pub fn fixed_fee_policy(&self) -> Option<FixedFeeConfig> {
        self.fixed_fees.get_or_default()
    }

    /// Configured external fee calculator, if any
    pub fn external_fee_calculator(&self) -> Option<Address> {
        self.fee_calculator.get_or_default()
    }

    /// Configured messenger, if any
    pub fn get_messenger(&self) -> Option<Address> {
        self.messenger.get()
    }

    /// Whether fee-exempt callers must still pass a nonzero max fee
    pub fn is_exempt_max_fee_required(&self) -> bool {
        self.exempt_max_fee_required.get_or_default()
    }

    /// Whether the pool is paused
    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    /// Pool admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(PoolError::Unauthorized)
    }

    // ============ Share token surface ============

    /// Share token name
    pub fn name(&self) -> String {
        self.share_token.name()
    }

    /// Share token symbol
    pub fn symbol(&self) -> String {
        self.share_token.symbol()
    }

    /// Share token precision
    pub fn decimals(&self) -> u8 {
        self.share_token.decimals()
    }

    /// Shares in circulation
    pub fn total_supply(&self) -> U256 {
        self.share_token.total_supply()
    }

    /// Share balance of an address
    pub fn balance_of(&self, owner: Address) -> U256 {
        self.share_token.balance_of(owner)
    }

    /// Remaining share allowance for a spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.share_token.allowance(owner, spender)
    }

    /// Transfer pool shares
    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        self.share_token.transfer(to, amount)
    }

    /// Approve a share spender
    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        self.share_token.approve(spender, amount)
    }

    /// Transfer pool shares on behalf of another holder
    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        self.share_token.transfer_from(from, to, amount)
    }

    // ============ Admin surface ============

    /// Update the supply cap. A cap below the currently pooled supply is
    /// rejected so the cap invariant can never be observed broken.
    pub fn set_supply_cap(&mut self, new_cap: U256) {
        self.only_admin();
        if new_cap < self.ledger.total_pooled() {
            self.env().revert(PoolError::InvalidCap);
        }
        let old_cap = self.supply_cap.get_or_default();
        self.supply_cap.set(new_cap);
        self.env().emit_event(SupplyCapUpdated { old_cap, new_cap });
    }

    /// Replace the redemption ranking wholesale.
    pub fn set_redemption_ranking(&mut self, ranking: Vec<AssetId>) {
        self.only_admin();
        let length = ranking.len() as u32;
        self.ranking.set(ranking);
        self.env().emit_event(RedemptionRankingUpdated { length });
    }

    /// Set vintage scores in batch. Only meaningful for score-adjusted
    /// pools; scores of already-deposited vintages are frozen.
    pub fn set_scores(
        &mut self,
        tokens: Vec<Address>,
        sub_ids: Vec<Option<U256>>,
        scores: Vec<u8>,
    ) {
        self.only_admin();
        if !self.score_adjusted.get_or_default() {
            self.env().revert(PoolError::ScoringDisabled);
        }
        if tokens.len() != sub_ids.len() || tokens.len() != scores.len() {
            self.env().revert(PoolError::LengthMismatch);
        }
        for i in 0..tokens.len() {
            let asset = AssetId {
                token: tokens[i],
                sub_id: sub_ids[i],
            };
            self.scores.set(asset, scores[i]);
            self.env().emit_event(ScoreUpdated {
                token: tokens[i],
                sub_id: sub_ids[i],
                score: scores[i],
            });
        }
    }

    /// Configure or clear the fixed fee policy.
    pub fn set_fixed_fee_policy(&mut self, config: Option<FixedFeeConfig>) {
        self.only_admin();
        if let Some(ref cfg) = config {
            if let Err(e) = cfg.validate() {
                self.env().revert(e);
            }
        }
        let configured = config.is_some();
        self.fixed_fees.set(config);
        self.env().emit_event(FixedFeePolicyUpdated { configured });
    }

    /// Configure or clear the external fee calculator. When set, it takes
    /// precedence over the fixed policy.
    pub fn set_external_fee_calculator(&mut self, calculator: Option<Address>) {
        self.only_admin();
        self.fee_calculator.set(calculator);
        self.env()
            .emit_event(ExternalFeeCalculatorUpdated { calculator });
    }

    /// Set the cross-domain messenger.
    pub fn set_messenger(&mut self, messenger: Address) {
        self.only_admin();
        self.messenger.set(messenger);
        self.env().emit_event(MessengerUpdated { messenger });
    }

    /// Exempt a caller from fees, or revoke the exemption.
    pub fn set_caller_fee_exemption(&mut self, caller: Address, exempt: bool) {
        self.only_admin();
        self.fee_exempt_callers.set(&caller, exempt);
        self.env()
            .emit_event(CallerFeeExemptionUpdated { caller, exempt });
    }

    /// Admit an asset to the destroy path, or revoke it.
    pub fn set_asset_fee_exemption(&mut self, token: Address, exempt: bool) {
        self.only_admin();
        self.fee_exempt_assets.set(&token, exempt);
        self.env()
            .emit_event(AssetFeeExemptionUpdated { token, exempt });
    }

    /// Configure whether fee-exempt callers must still pass a nonzero
    /// max fee.
    pub fn set_exempt_max_fee_required(&mut self, required: bool) {
        self.only_admin();
        self.exempt_max_fee_required.set(required);
    }

    /// Suspend deposits, redemptions and bridging. Queries stay open.
    pub fn pause(&mut self) {
        self.only_admin();
        self.paused.set(true);
        let by = self.env().caller();
        self.env().emit_event(PoolPaused { by });
    }

    /// Resume operation.
    pub fn unpause(&mut self) {
        self.only_admin();
        self.paused.set(false);
        let by = self.env().caller();
        self.env().emit_event(PoolUnpaused { by });
    }

    /// Transfer admin rights.
    pub fn transfer_admin(&mut self, new_admin: Address) {
        self.only_admin();
        self.admin.set(new_admin);
    }

    // ============ Internal ============

    /// redeem_out/redeem_and_retire shared body: amounts are underlying,
    /// the fee is charged on top. Returns total shares spent.
    fn redeem_out_internal(
        &mut self,
        caller: Address,
        tokens: &Vec<Address>,
        sub_ids: &Vec<Option<U256>>,
        amounts: &Vec<U256>,
        max_fee: U256,
        retiring: bool,
    ) -> U256 {
        self.check_batch(tokens, sub_ids, amounts);

        let mut share_amounts = Vec::new();
        for i in 0..tokens.len() {
            if amounts[i].is_zero() {
                self.env().revert(PoolError::ZeroAmount);
            }
            self.require_eligible(tokens[i], sub_ids[i]);
            let scale = self.asset_scale(tokens[i]);
            share_amounts.push(self.checked(PoolMath::to_pool_units(amounts[i], scale)));
        }

        let (_, dist) =
            self.redemption_fee_breakdown(caller, tokens, sub_ids, &share_amounts, retiring);
        let fee_total = self.checked(dist.total());
        self.enforce_redemption_max_fee(caller, fee_total, max_fee);

        let mut spent = U256::zero();
        for i in 0..tokens.len() {
            self.burn_for_release(caller, tokens[i], sub_ids[i], share_amounts[i]);
            if !retiring {
                let mut vintage = VintageTokenContractRef::new(self.env(), tokens[i]);
                if !vintage.transfer(caller, sub_ids[i], amounts[i]) {
                    self.env().revert(PoolError::TransferFailed);
                }
            }
            spent = self.checked(SafeMath::add(spent, share_amounts[i]));
            self.env().emit_event(Redeemed {
                caller,
                token: tokens[i],
                sub_id: sub_ids[i],
                amount: amounts[i],
                shares: share_amounts[i],
                retiring,
            });
        }
        self.collect_redemption_fee(caller, &dist);
        self.checked(SafeMath::add(spent, fee_total))
    }

    /// Burn the share-side counterpart of a release and decrement the
    /// ledger. With score adjustment, the caller burns only the scored
    /// fraction and the pool's own reserve covers the remainder.
    ///
    /// Does not screen eligibility: the selective modes check it up
    /// front, while the destroy and automatic paths deliberately accept
    /// vintages the filter no longer does.
    fn burn_for_release(
        &mut self,
        caller: Address,
        token: Address,
        sub_id: Option<U256>,
        shares: U256,
    ) {
        if self.score_adjusted.get_or_default() {
            let asset = AssetId { token, sub_id };
            let score = self.scores.score_of(asset);
            if score == 0 {
                self.env().revert(PoolError::ScoreUnset);
            }
            let (caller_burn, reserve_burn) = self.checked(PoolMath::score_split(shares, score));
            if !reserve_burn.is_zero() {
                let self_addr = self.env().self_address();
                if self.share_token.balance_of(self_addr) < reserve_burn {
                    self.env().revert(PoolError::InsufficientReserve);
                }
                self.share_token.burn(self_addr, reserve_burn);
            }
            self.share_token.burn(caller, caller_burn);
        } else {
            self.share_token.burn(caller, shares);
        }
        let project = self.project_of(token, sub_id);
        self.ledger.debit(project, shares);
    }

    /// Deposit fee under the configured model. Pure.
    fn deposit_fee_breakdown(
        &self,
        caller: Address,
        token: Address,
        sub_id: Option<U256>,
        amount_shares: U256,
    ) -> FeeDistribution {
        if self.fee_exempt_callers.get(&caller).unwrap_or(false) {
            return FeeDistribution::none();
        }
        if let Some(calculator) = self.fee_calculator.get_or_default() {
            let self_addr = self.env().self_address();
            let dist = FeeCalculatorContractRef::new(self.env(), calculator)
                .calculate_deposit_fees(self_addr, token, sub_id, amount_shares);
            if !dist.is_well_formed() {
                self.env().revert(PoolError::MalformedFeeDistribution);
            }
            return dist;
        }
        if let Some(cfg) = self.fixed_fees.get_or_default() {
            let fee = self.checked(cfg.deposit_fee(self.ledger.total_pooled(), amount_shares));
            return FeeDistribution::single(cfg.fee_receiver, fee);
        }
        FeeDistribution::none()
    }

    /// Redemption fee under the configured model. Returns the fee charged
    /// per asset together with the payable distribution; both are derived
    /// from the same per-asset figures so the caller never pays more than
    /// the per-asset sums. Pure.
    fn redemption_fee_breakdown(
        &self,
        caller: Address,
        tokens: &Vec<Address>,
        sub_ids: &Vec<Option<U256>>,
        amounts_shares: &Vec<U256>,
        retiring: bool,
    ) -> (Vec<U256>, FeeDistribution) {
        let mut per_asset = Vec::new();
        if self.fee_exempt_callers.get(&caller).unwrap_or(false) {
            for _ in 0..tokens.len() {
                per_asset.push(U256::zero());
            }
            return (per_asset, FeeDistribution::none());
        }
        if let Some(calculator) = self.fee_calculator.get_or_default() {
            // the external model quotes per call, not per asset
            if tokens.len() != 1 {
                self.env().revert(PoolError::UnsupportedOperation);
            }
            let self_addr = self.env().self_address();
            let dist = FeeCalculatorContractRef::new(self.env(), calculator)
                .calculate_redemption_fees(
                    self_addr,
                    tokens.clone(),
                    sub_ids.clone(),
                    amounts_shares.clone(),
                );
            if !dist.is_well_formed() {
                self.env().revert(PoolError::MalformedFeeDistribution);
            }
            per_asset.push(self.checked(dist.total()));
            return (per_asset, dist);
        }
        if let Some(cfg) = self.fixed_fees.get_or_default() {
            let mut fee_total = U256::zero();
            for amount in amounts_shares {
                let fee = self.checked(cfg.redemption_fee(*amount, retiring));
                fee_total = self.checked(SafeMath::add(fee_total, fee));
                per_asset.push(fee);
            }
            let mut dist = FeeDistribution::none();
            if !fee_total.is_zero() {
                let (burned, to_receiver) = self.checked(cfg.burn_split(fee_total));
                if !to_receiver.is_zero() {
                    dist.recipients.push(cfg.fee_receiver);
                    dist.amounts.push(to_receiver);
                }
                if !burned.is_zero() {
                    dist.recipients.push(cfg.burn_address);
                    dist.amounts.push(burned);
                }
            }
            return (per_asset, dist);
        }
        for _ in 0..tokens.len() {
            per_asset.push(U256::zero());
        }
        (per_asset, FeeDistribution::none())
    }

    /// Enforce the batch fee bound for redemptions.
    fn enforce_redemption_max_fee(&self, caller: Address, fee_total: U256, max_fee: U256) {
        if !self.has_fee_policy() {
            return;
        }
        if max_fee.is_zero() {
            let exempt = self.fee_exempt_callers.get(&caller).unwrap_or(false);
            if !exempt || self.exempt_max_fee_required.get_or_default() {
                self.env().revert(PoolError::MaxFeeRequired);
            }
        }
        if fee_total > max_fee {
            self.env().revert(PoolError::FeeExceedsMax);
        }
    }

    /// Move the collected redemption fee out of the caller's shares.
    fn collect_redemption_fee(&mut self, caller: Address, dist: &FeeDistribution) {
        for i in 0..dist.recipients.len() {
            self.share_token
                .transfer_raw(caller, dist.recipients[i], dist.amounts[i]);
            self.env().emit_event(FeePaid {
                recipient: dist.recipients[i],
                amount: dist.amounts[i],
            });
        }
    }

    fn has_fee_policy(&self) -> bool {
        self.fee_calculator.get_or_default().is_some()
            || self.fixed_fees.get_or_default().is_some()
    }

    /// Screen a vintage through the filter; an unexpected failure inside
    /// the filter propagates untouched.
    fn require_eligible(&self, token: Address, sub_id: Option<U256>) {
        if self.check_eligible(token, sub_id).is_some() {
            self.env().revert(PoolError::AssetIneligible);
        }
    }

    /// Conversion factor of an asset to pool share precision.
    fn asset_scale(&self, token: Address) -> U256 {
        let decimals = VintageTokenContractRef::new(self.env(), token).decimals();
        self.checked(PoolMath::scale_factor(decimals))
    }

    /// Project identifier a vintage contributes supply under.
    fn project_of(&self, token: Address, sub_id: Option<U256>) -> String {
        VintageTokenContractRef::new(self.env(), token)
            .attributes(sub_id)
            .project_id
    }

    fn check_batch(
        &self,
        tokens: &Vec<Address>,
        sub_ids: &Vec<Option<U256>>,
        amounts: &Vec<U256>,
    ) {
        if tokens.is_empty() {
            self.env().revert(PoolError::ZeroAmount);
        }
        if tokens.len() != sub_ids.len() || tokens.len() != amounts.len() {
            self.env().revert(PoolError::LengthMismatch);
        }
    }

    fn checked<T>(&self, result: Result<T, PoolError>) -> T {
        result.unwrap_or_else(|e| self.env().revert(e))
    }

    fn only_admin(&self) {
        let admin = self.admin.get_or_revert_with(PoolError::Unauthorized);
        if self.env().caller() != admin {
            self.env().revert(PoolError::Unauthorized);
        }
    }

    fn ensure_not_paused(&self) {
        if self.paused.get_or_default() {
            self.env().revert(PoolError::Paused);
        }
    }

    /// Reentrancy lock; external collaborators cannot re-enter the
    /// engine mid-update.
    fn lock(&mut self) {
        if self.locked.get_or_default() {
            self.env().revert(PoolError::Locked);
        }
        self.locked.set(true);
    }

    fn unlock(&mut self) {
        self.locked.set(false);
    }
}
