//! Host-environment tests for the pool engine and its collaborators.
use odra::casper_types::{U256, U512};
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::*;
use crate::filter::{AttributeFilter, AttributeFilterHostRef};
use crate::pool::engine::{CarbonPool, CarbonPoolHostRef, CarbonPoolInitArgs};
use crate::pool::bridge::{ChannelMessenger, ChannelMessengerInitArgs};
use crate::pool::fees::{FixedFeeConfig, FlatFeeCalculator, FlatFeeCalculatorInitArgs};
use crate::vintage::{AssetId, CarbonVintage, CarbonVintageHostRef, CarbonVintageInitArgs, VintageAttributes};

fn e18(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

fn e6(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(6u64))
}

fn bp_of(amount: U256, bp: u64) -> U256 {
    amount * U256::from(bp) / U256::from(10_000u64)
}

fn setup(cap_units: u64, score_adjusted: bool) -> (HostEnv, CarbonPoolHostRef, AttributeFilterHostRef) {
    let env = odra_test::env();
    let filter = AttributeFilter::deploy(&env, NoArgs);
    let pool = CarbonPool::deploy(
        &env,
        CarbonPoolInitArgs {
            name: String::from("Pooled Carbon Shares"),
            symbol: String::from("PCS"),
            supply_cap: e18(cap_units),
            filter: *filter.address(),
            score_adjusted,
        },
    );
    (env, pool, filter)
}

fn deploy_vintage(env: &HostEnv, project: &str, decimals: u8) -> CarbonVintageHostRef {
    CarbonVintage::deploy(
        env,
        CarbonVintageInitArgs {
            name: String::from(project),
            symbol: String::from("TCO2"),
            decimals,
            attributes: VintageAttributes {
                project_id: String::from(project),
                region: String::from("LATAM"),
                methodology: String::from("VM0015"),
                vintage_begin: 1_546_300_800,
            },
        },
    )
}

/// Mints certificates to `user` and deposits them into the pool.
/// Leaves the caller reset to the admin account.
fn deposit_as(
    env: &HostEnv,
    pool: &mut CarbonPoolHostRef,
    vintage: &mut CarbonVintageHostRef,
    user: Address,
    amount: U256,
    max_fee: U256,
) -> U256 {
    env.set_caller(env.get_account(0));
    vintage.mint(user, amount);
    env.set_caller(user);
    vintage.approve(*pool.address(), amount);
    let minted = pool.deposit(*vintage.address(), None, amount, max_fee);
    env.set_caller(env.get_account(0));
    minted
}

fn fee_config(env: &HostEnv) -> FixedFeeConfig {
    FixedFeeConfig {
        redemption_fee_bp: 250,
        retirement_fee_bp: 100,
        fee_burn_bp: 2_000,
        fee_receiver: env.get_account(8),
        burn_address: env.get_account(9),
        deposit_fee_bp: 0,
        seeding_threshold: U256::zero(),
    }
}

#[test]
fn test_deposit_mints_shares_and_updates_ledger() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);

    let minted = deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    assert_eq!(minted, e18(100));
    assert_eq!(pool.balance_of(user), e18(100));
    assert_eq!(pool.total_supply(), e18(100));
    assert_eq!(pool.total_pooled(), e18(100));
    assert_eq!(pool.project_pooled(String::from("VCS-A")), e18(100));
    assert_eq!(vintage.balance_of(*pool.address(), None), e18(100));
    assert_eq!(vintage.balance_of(user, None), U256::zero());
}

#[test]
fn test_deposit_screens_through_filter() {
    let (env, mut pool, mut filter) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let token = *vintage.address();

    filter.set_denied(token, true);
    assert_eq!(
        pool.check_eligible(token, None),
        Some(String::from("vintage is on the deny list"))
    );

    vintage.mint(user, e18(10));
    env.set_caller(user);
    vintage.approve(*pool.address(), e18(10));
    assert!(pool.try_deposit(token, None, e18(10), U256::zero()).is_err());
}

#[test]
fn test_deposit_clamps_to_cap_then_pool_full() {
    let (env, mut pool, _) = setup(100, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);

    // a 150-unit request against a 100-unit cap is partially accepted
    let minted = deposit_as(&env, &mut pool, &mut vintage, user, e18(150), U256::zero());
    assert_eq!(minted, e18(100));
    assert_eq!(pool.total_pooled(), e18(100));
    assert_eq!(pool.remaining_capacity(), U256::zero());
    // the unaccepted remainder stays with the depositor
    assert_eq!(vintage.balance_of(user, None), e18(50));

    // the full pool rejects rather than clamping to zero
    env.set_caller(user);
    vintage.approve(*pool.address(), e18(50));
    assert!(pool
        .try_deposit(*vintage.address(), None, e18(50), U256::zero())
        .is_err());
}

#[test]
fn test_low_precision_vintage_scales_to_pool_units() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 6);
    let user = env.get_account(1);

    let minted = deposit_as(&env, &mut pool, &mut vintage, user, e6(5), U256::zero());
    assert_eq!(minted, e18(5));

    env.set_caller(user);
    let released = pool.redeem_in(
        vec![*vintage.address()],
        vec![None],
        vec![e18(2)],
        U256::zero(),
    );
    assert_eq!(released, vec![e6(2)]);
    assert_eq!(vintage.balance_of(user, None), e6(2));
    assert_eq!(pool.balance_of(user), e18(3));
}

#[test]
fn test_deposit_fee_above_seeding_threshold() {
    let (env, mut pool, _) = setup(10_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let mut cfg = fee_config(&env);
    cfg.deposit_fee_bp = 100; // 1%
    let receiver = cfg.fee_receiver;
    pool.set_fixed_fee_policy(Some(cfg));

    // a zero max fee is rejected once a fee would be charged
    vintage.mint(user, e18(100));
    env.set_caller(user);
    vintage.approve(*pool.address(), e18(100));
    assert!(pool
        .try_deposit(*vintage.address(), None, e18(100), U256::zero())
        .is_err());
    // too tight a bound aborts as well
    assert!(pool
        .try_deposit(*vintage.address(), None, e18(100), bp_of(e18(100), 50))
        .is_err());

    let minted = pool.deposit(*vintage.address(), None, e18(100), e18(1));
    assert_eq!(minted, e18(99));
    assert_eq!(pool.balance_of(receiver), e18(1));
    // the fee is minted alongside, so supply still matches the ledger
    assert_eq!(pool.total_supply(), e18(100));
    assert_eq!(pool.total_pooled(), e18(100));
}

#[test]
fn test_redeem_in_nets_fee_out_of_spend() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let cfg = fee_config(&env);
    let receiver = cfg.fee_receiver;
    let burn_addr = cfg.burn_address;
    pool.set_fixed_fee_policy(Some(cfg));

    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    let fee = bp_of(e18(40), 250);
    env.set_caller(user);
    let released = pool.redeem_in(vec![*vintage.address()], vec![None], vec![e18(40)], fee);

    assert_eq!(released, vec![e18(40) - fee]);
    assert_eq!(vintage.balance_of(user, None), e18(40) - fee);
    assert_eq!(pool.balance_of(user), e18(60));
    // 80% of the fee goes to the receiver, 20% to the burn address
    assert_eq!(pool.balance_of(receiver), bp_of(fee, 8_000));
    assert_eq!(pool.balance_of(burn_addr), bp_of(fee, 2_000));
    // shares in circulation still match the pooled supply
    assert_eq!(pool.total_supply(), pool.total_pooled());
}

#[test]
fn test_redeem_out_charges_fee_on_top() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    pool.set_fixed_fee_policy(Some(fee_config(&env)));

    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    let fee = bp_of(e18(30), 250);
    env.set_caller(user);
    let spent = pool.redeem_out(vec![*vintage.address()], vec![None], vec![e18(30)], fee);

    assert_eq!(spent, e18(30) + fee);
    assert_eq!(vintage.balance_of(user, None), e18(30));
    assert_eq!(pool.balance_of(user), e18(100) - e18(30) - fee);
    assert_eq!(pool.total_pooled(), e18(70));
}

#[test]
fn test_redemption_fee_bound_is_mandatory() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    pool.set_fixed_fee_policy(Some(fee_config(&env)));
    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    let tokens = vec![*vintage.address()];
    env.set_caller(user);
    // no bound at all
    assert!(pool
        .try_redeem_in(tokens.clone(), vec![None], vec![e18(40)], U256::zero())
        .is_err());
    // bound below the actual fee
    let fee = bp_of(e18(40), 250);
    assert!(pool
        .try_redeem_in(tokens, vec![None], vec![e18(40)], fee - U256::one())
        .is_err());
    // nothing was redeemed
    assert_eq!(pool.balance_of(user), e18(100));
}

#[test]
fn test_fee_exempt_caller() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    pool.set_fixed_fee_policy(Some(fee_config(&env)));
    pool.set_caller_fee_exemption(user, true);
    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    // exempt callers still have to pass a bound by default
    env.set_caller(user);
    assert!(pool
        .try_redeem_in(
            vec![*vintage.address()],
            vec![None],
            vec![e18(40)],
            U256::zero()
        )
        .is_err());
    let released = pool.redeem_in(
        vec![*vintage.address()],
        vec![None],
        vec![e18(40)],
        U256::one(),
    );
    assert_eq!(released, vec![e18(40)]);

    // with the requirement lifted, a zero bound passes too
    env.set_caller(env.get_account(0));
    pool.set_exempt_max_fee_required(false);
    env.set_caller(user);
    let released = pool.redeem_in(
        vec![*vintage.address()],
        vec![None],
        vec![e18(10)],
        U256::zero(),
    );
    assert_eq!(released, vec![e18(10)]);
}

#[test]
fn test_redeem_and_retire_is_atomic_and_ordered() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage_a = deploy_vintage(&env, "VCS-A", 18);
    let mut vintage_b = deploy_vintage(&env, "VCS-B", 18);
    let user = env.get_account(1);
    pool.set_fixed_fee_policy(Some(fee_config(&env)));

    deposit_as(&env, &mut pool, &mut vintage_a, user, e18(50), U256::zero());
    deposit_as(&env, &mut pool, &mut vintage_b, user, e18(50), U256::zero());

    // the retirement rate (1%) applies, not the plain redemption rate
    let fee = bp_of(e18(15), 100);
    env.set_caller(user);
    let ids = pool.redeem_and_retire(
        vec![*vintage_a.address(), *vintage_b.address()],
        vec![None, None],
        vec![e18(10), e18(5)],
        fee,
    );

    assert_eq!(ids, vec![0u64, 0u64]);
    // nothing was delivered; the certificates were retired out of custody
    assert_eq!(vintage_a.balance_of(user, None), U256::zero());
    assert_eq!(vintage_a.total_retired(), e18(10));
    assert_eq!(vintage_b.total_retired(), e18(5));
    assert_eq!(pool.balance_of(user), e18(100) - e18(15) - fee);
    assert_eq!(pool.total_pooled(), e18(85));

    // a second retirement from the same vintage gets the next identifier
    let fee = bp_of(e18(5), 100);
    let ids = pool.redeem_and_retire(vec![*vintage_a.address()], vec![None], vec![e18(5)], fee);
    assert_eq!(ids, vec![1u64]);
}

#[test]
fn test_redeem_and_burn_requires_asset_exemption() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    pool.set_fixed_fee_policy(Some(fee_config(&env)));
    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    env.set_caller(user);
    assert!(pool
        .try_redeem_and_burn(*vintage.address(), None, e18(20))
        .is_err());

    env.set_caller(env.get_account(0));
    pool.set_asset_fee_exemption(*vintage.address(), true);
    env.set_caller(user);
    pool.redeem_and_burn(*vintage.address(), None, e18(20));

    // destroyed, not retired, and no fee despite the configured policy
    assert_eq!(vintage.total_supply(), e18(80));
    assert_eq!(vintage.total_retired(), U256::zero());
    assert_eq!(pool.balance_of(user), e18(80));
    assert_eq!(pool.total_pooled(), e18(80));
}

#[test]
fn test_redeem_and_burn_disposes_of_deny_listed_asset() {
    let (env, mut pool, mut filter) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    pool.set_asset_fee_exemption(*vintage.address(), true);
    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    // the vintage is recalled after pooling
    filter.set_denied(*vintage.address(), true);

    // selective redemption screens it out
    env.set_caller(user);
    assert!(pool
        .try_redeem_in(vec![*vintage.address()], vec![None], vec![e18(20)], U256::zero())
        .is_err());

    // the destroy path exists precisely for disposing of such assets
    pool.redeem_and_burn(*vintage.address(), None, e18(20));
    assert_eq!(vintage.total_supply(), e18(80));
    assert_eq!(pool.balance_of(user), e18(80));
    assert_eq!(pool.total_pooled(), e18(80));
}

#[test]
fn test_redeem_auto_greedy_over_ranking() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage_a = deploy_vintage(&env, "VCS-A", 18);
    let mut vintage_b = deploy_vintage(&env, "VCS-B", 18);
    let mut vintage_c = deploy_vintage(&env, "VCS-C", 18);
    let vintage_d = deploy_vintage(&env, "VCS-D", 18);
    let user = env.get_account(1);

    deposit_as(&env, &mut pool, &mut vintage_a, user, e18(10), U256::zero());
    deposit_as(&env, &mut pool, &mut vintage_b, user, e18(5), U256::zero());
    deposit_as(&env, &mut pool, &mut vintage_c, user, e18(20), U256::zero());

    // D is ranked first but has no pooled balance; it must be skipped
    pool.set_redemption_ranking(vec![
        AssetId { token: *vintage_d.address(), sub_id: None },
        AssetId { token: *vintage_a.address(), sub_id: None },
        AssetId { token: *vintage_b.address(), sub_id: None },
        AssetId { token: *vintage_c.address(), sub_id: None },
    ]);

    env.set_caller(user);
    let selected = pool.redeem_auto(e18(12));

    // A is drained (10), B covers the remainder (2), C is never touched
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].token, *vintage_a.address());
    assert_eq!(selected[0].amount, e18(10));
    assert_eq!(selected[1].token, *vintage_b.address());
    assert_eq!(selected[1].amount, e18(2));
    assert_eq!(vintage_a.balance_of(user, None), e18(10));
    assert_eq!(vintage_b.balance_of(user, None), e18(2));
    assert_eq!(vintage_c.balance_of(*pool.address(), None), e18(20));
    assert_eq!(pool.balance_of(user), e18(23));
    assert_eq!(pool.total_pooled(), e18(23));
}

#[test]
fn test_redeem_auto_fails_when_ranking_exhausted() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    deposit_as(&env, &mut pool, &mut vintage, user, e18(10), U256::zero());
    pool.set_redemption_ranking(vec![AssetId {
        token: *vintage.address(),
        sub_id: None,
    }]);

    env.set_caller(user);
    assert!(pool.try_redeem_auto(e18(12)).is_err());
    // all-or-nothing: the partial match was rolled back
    assert_eq!(pool.balance_of(user), e18(10));
    assert_eq!(pool.total_pooled(), e18(10));
    assert_eq!(vintage.balance_of(user, None), U256::zero());
}

#[test]
fn test_redeem_auto_draws_from_later_denied_asset() {
    let (env, mut pool, mut filter) = setup(1_000, false);
    let mut vintage_a = deploy_vintage(&env, "VCS-A", 18);
    let mut vintage_b = deploy_vintage(&env, "VCS-B", 18);
    let user = env.get_account(1);

    deposit_as(&env, &mut pool, &mut vintage_a, user, e18(10), U256::zero());
    deposit_as(&env, &mut pool, &mut vintage_b, user, e18(10), U256::zero());
    pool.set_redemption_ranking(vec![
        AssetId { token: *vintage_a.address(), sub_id: None },
        AssetId { token: *vintage_b.address(), sub_id: None },
    ]);

    // A gets deny-listed after pooling; the automatic path must still be
    // able to flush it, its only failure mode is insufficient supply
    filter.set_denied(*vintage_a.address(), true);

    env.set_caller(user);
    let selected = pool.redeem_auto(e18(12));
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].token, *vintage_a.address());
    assert_eq!(selected[0].amount, e18(10));
    assert_eq!(selected[1].token, *vintage_b.address());
    assert_eq!(selected[1].amount, e18(2));
    assert_eq!(vintage_a.balance_of(user, None), e18(10));
    assert_eq!(pool.total_pooled(), e18(8));
}

#[test]
fn test_score_adjusted_deposit_and_redemption() {
    let (env, mut pool, _) = setup(1_000, true);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let token = *vintage.address();

    // unscored vintages cannot be deposited
    vintage.mint(user, e18(100));
    env.set_caller(user);
    vintage.approve(*pool.address(), e18(100));
    assert!(pool.try_deposit(token, None, e18(100), U256::zero()).is_err());

    env.set_caller(env.get_account(0));
    pool.set_scores(vec![token], vec![None], vec![75]);
    assert_eq!(pool.score_of(token, None), 75);

    env.set_caller(user);
    let minted = pool.deposit(token, None, e18(100), U256::zero());
    assert_eq!(minted, e18(75));
    // the unscored remainder sits in the pool's own reserve
    assert_eq!(pool.balance_of(*pool.address()), e18(25));
    assert_eq!(pool.total_pooled(), e18(100));
    assert_eq!(pool.total_supply(), e18(100));

    // redemption burns at the same rate from both sides
    let released = pool.redeem_in(vec![token], vec![None], vec![e18(40)], U256::zero());
    assert_eq!(released, vec![e18(40)]);
    assert_eq!(pool.balance_of(user), e18(75) - e18(30));
    assert_eq!(pool.balance_of(*pool.address()), e18(25) - e18(10));
    assert_eq!(pool.total_pooled(), e18(60));
    assert_eq!(pool.total_supply(), e18(60));
}

#[test]
fn test_adjusted_redemption_requires_pool_reserve() {
    let (env, mut pool, _) = setup(1_000, true);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let token = *vintage.address();

    // 3 raw units at score 50: caller gets floor(1.5) = 1, reserve gets 2
    pool.set_scores(vec![token], vec![None], vec![50]);
    deposit_as(&env, &mut pool, &mut vintage, user, U256::from(3u64), U256::zero());
    assert_eq!(pool.balance_of(user), U256::one());
    assert_eq!(pool.balance_of(*pool.address()), U256::from(2u64));

    // each 1-unit redemption rounds the caller's burn down to zero, so the
    // reserve covers the whole unit; two such calls drain it
    env.set_caller(user);
    pool.redeem_in(vec![token], vec![None], vec![U256::one()], U256::zero());
    pool.redeem_in(vec![token], vec![None], vec![U256::one()], U256::zero());
    assert_eq!(pool.balance_of(*pool.address()), U256::zero());

    // the third needs reserve the pool no longer has
    assert!(pool
        .try_redeem_in(vec![token], vec![None], vec![U256::one()], U256::zero())
        .is_err());
    assert_eq!(pool.total_pooled(), U256::one());
}

#[test]
fn test_scores_freeze_after_first_deposit() {
    let (env, mut pool, _) = setup(1_000, true);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let token = *vintage.address();

    // out-of-range scores are rejected outright
    assert!(pool.try_set_scores(vec![token], vec![None], vec![0]).is_err());
    assert!(pool.try_set_scores(vec![token], vec![None], vec![101]).is_err());

    pool.set_scores(vec![token], vec![None], vec![80]);
    // re-scoring is fine before any deposit
    pool.set_scores(vec![token], vec![None], vec![90]);

    deposit_as(&env, &mut pool, &mut vintage, user, e18(10), U256::zero());
    assert!(pool.is_vintage_deposited(token, None));
    assert!(pool.try_set_scores(vec![token], vec![None], vec![95]).is_err());
    assert_eq!(pool.score_of(token, None), 90);
}

#[test]
fn test_scoring_disabled_on_plain_pools() {
    let (env, mut pool, _) = setup(1_000, false);
    let vintage = deploy_vintage(&env, "VCS-A", 18);
    assert!(!pool.is_score_adjusted());
    assert!(pool
        .try_set_scores(vec![*vintage.address()], vec![None], vec![50])
        .is_err());
}

#[test]
fn test_supply_cap_update_rules() {
    let (env, mut pool, _) = setup(100, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    deposit_as(&env, &mut pool, &mut vintage, user, e18(60), U256::zero());

    // a cap below the pooled supply would break the cap invariant
    assert!(pool.try_set_supply_cap(e18(50)).is_err());
    pool.set_supply_cap(e18(200));
    assert_eq!(pool.supply_cap(), e18(200));
    assert_eq!(pool.remaining_capacity(), e18(140));

    env.set_caller(user);
    assert!(pool.try_set_supply_cap(e18(300)).is_err());
}

#[test]
fn test_pause_gates_state_changes() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    deposit_as(&env, &mut pool, &mut vintage, user, e18(50), U256::zero());

    env.set_caller(user);
    assert!(pool.try_pause().is_err());

    env.set_caller(env.get_account(0));
    pool.pause();
    assert!(pool.is_paused());

    env.set_caller(user);
    vintage.approve(*pool.address(), e18(1));
    assert!(pool
        .try_deposit(*vintage.address(), None, e18(1), U256::zero())
        .is_err());
    assert!(pool
        .try_redeem_in(vec![*vintage.address()], vec![None], vec![e18(1)], U256::zero())
        .is_err());
    // queries stay open while paused
    assert_eq!(pool.total_pooled(), e18(50));

    env.set_caller(env.get_account(0));
    pool.unpause();
    let minted = deposit_as(&env, &mut pool, &mut vintage, user, e18(1), U256::zero());
    assert_eq!(minted, e18(1));
}

#[test]
fn test_bridge_reconciles_ledger_and_splits_payment() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage_a = deploy_vintage(&env, "VCS-A", 18);
    let mut vintage_b = deploy_vintage(&env, "VCS-B", 18);
    let user = env.get_account(1);
    let remote = env.get_account(7);

    let mut messenger = ChannelMessenger::deploy(
        &env,
        ChannelMessengerInitArgs { base_fee: U512::from(10u64) },
    );
    messenger.register_remote_pool(*vintage_a.address(), 5, remote);
    messenger.register_remote_pool(*vintage_b.address(), 5, remote);
    messenger.set_dispatcher(*pool.address(), true);
    pool.set_messenger(*messenger.address());

    deposit_as(&env, &mut pool, &mut vintage_a, user, e18(30), U256::zero());
    deposit_as(&env, &mut pool, &mut vintage_b, user, e18(30), U256::zero());

    assert_eq!(
        pool.quote_bridge_fee(5, vec![*vintage_a.address(), *vintage_b.address()], vec![e18(10), e18(10)]),
        U512::from(20u64)
    );

    let before = env.balance_of(messenger.address());
    pool.with_tokens(U512::from(25u64)).bridge_assets(
        5,
        vec![*vintage_a.address(), *vintage_b.address()],
        vec![None, None],
        vec![e18(10), e18(10)],
    );

    // the ledger shrinks but the shares keep circulating
    assert_eq!(pool.total_pooled(), e18(40));
    assert_eq!(pool.project_pooled(String::from("VCS-A")), e18(20));
    assert_eq!(pool.total_supply(), e18(60));
    // certificates were handed to the messenger
    assert_eq!(vintage_a.balance_of(*messenger.address(), None), e18(10));
    assert_eq!(vintage_b.balance_of(*messenger.address(), None), e18(10));
    assert_eq!(messenger.dispatch_count(), 2);
    // 25 / 2 = 12 per asset; the odd unit is forfeited, not refunded
    assert_eq!(env.balance_of(messenger.address()) - before, U512::from(24u64));
}

#[test]
fn test_bridge_rejects_unmapped_domain_and_non_admin() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let remote = env.get_account(7);

    let mut messenger =
        ChannelMessenger::deploy(&env, ChannelMessengerInitArgs { base_fee: U512::zero() });
    messenger.register_remote_pool(*vintage.address(), 5, remote);
    messenger.set_dispatcher(*pool.address(), true);
    pool.set_messenger(*messenger.address());
    deposit_as(&env, &mut pool, &mut vintage, user, e18(30), U256::zero());

    // domain 9 has no registered remote pool
    assert!(pool
        .try_bridge_assets(9, vec![*vintage.address()], vec![None], vec![e18(10)])
        .is_err());
    assert_eq!(pool.total_pooled(), e18(30));

    env.set_caller(user);
    assert!(pool
        .try_bridge_assets(5, vec![*vintage.address()], vec![None], vec![e18(10)])
        .is_err());
}

#[test]
fn test_dispatch_requires_authorized_pool() {
    let env = odra_test::env();
    let remote = env.get_account(7);
    let token = env.get_account(6);
    let mut messenger =
        ChannelMessenger::deploy(&env, ChannelMessengerInitArgs { base_fee: U512::zero() });
    messenger.register_remote_pool(token, 5, remote);

    // an arbitrary caller cannot inflate the dispatch record
    env.set_caller(env.get_account(1));
    assert!(messenger
        .try_dispatch_transfer(5, token, None, e18(1), remote, U512::zero())
        .is_err());
    assert_eq!(messenger.dispatch_count(), 0);

    // only the admin hands out dispatch rights
    assert!(messenger
        .try_set_dispatcher(env.get_account(1), true)
        .is_err());

    env.set_caller(env.get_account(0));
    messenger.set_dispatcher(env.get_account(1), true);
    assert!(messenger.is_dispatcher(env.get_account(1)));
    env.set_caller(env.get_account(1));
    messenger.dispatch_transfer(5, token, None, e18(1), remote, U512::zero());
    assert_eq!(messenger.dispatch_count(), 1);
}

#[test]
fn test_external_calculator_takes_precedence() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let mut vintage_b = deploy_vintage(&env, "VCS-B", 18);
    let user = env.get_account(1);
    let external_recipient = env.get_account(6);

    pool.set_fixed_fee_policy(Some(fee_config(&env)));
    let calculator = FlatFeeCalculator::deploy(
        &env,
        FlatFeeCalculatorInitArgs {
            recipient: external_recipient,
            deposit_fee_bp: 0,
            redemption_fee_bp: 100,
            seeding_threshold: U256::zero(),
        },
    );
    pool.set_external_fee_calculator(Some(*calculator.address()));

    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());
    deposit_as(&env, &mut pool, &mut vintage_b, user, e18(100), U256::zero());

    // the external rate (1%) applies, not the fixed policy's 2.5%
    let fee = bp_of(e18(40), 100);
    let quoted = pool.quote_redemption_fee(vec![*vintage.address()], vec![None], vec![e18(40)], false);
    assert_eq!(quoted.total().unwrap(), fee);

    env.set_caller(user);
    let released = pool.redeem_in(vec![*vintage.address()], vec![None], vec![e18(40)], fee);
    assert_eq!(released, vec![e18(40) - fee]);
    assert_eq!(pool.balance_of(external_recipient), fee);

    // the external model quotes per call and rejects multi-asset batches
    assert!(pool
        .try_redeem_in(
            vec![*vintage.address(), *vintage_b.address()],
            vec![None, None],
            vec![e18(10), e18(10)],
            e18(1)
        )
        .is_err());
}

#[test]
fn test_quotes_match_charged_fees() {
    let (env, mut pool, _) = setup(10_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    let mut cfg = fee_config(&env);
    cfg.deposit_fee_bp = 100;
    cfg.seeding_threshold = e18(50);
    pool.set_fixed_fee_policy(Some(cfg));

    // first 50 units seed the pool for free, the next 50 are chargeable
    env.set_caller(user);
    let quoted = pool.quote_deposit_fee(*vintage.address(), None, e18(100));
    assert_eq!(quoted.total().unwrap(), bp_of(e18(50), 100));

    let minted = deposit_as(&env, &mut pool, &mut vintage, user, e18(100), e18(1));
    assert_eq!(minted, e18(100) - bp_of(e18(50), 100));

    env.set_caller(user);
    let quoted = pool.quote_redemption_fee(vec![*vintage.address()], vec![None], vec![e18(20)], true);
    assert_eq!(quoted.total().unwrap(), bp_of(e18(20), 100));
    let quoted = pool.quote_redemption_fee(vec![*vintage.address()], vec![None], vec![e18(20)], false);
    assert_eq!(quoted.total().unwrap(), bp_of(e18(20), 250));
}

#[test]
fn test_batch_shape_is_validated() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);
    deposit_as(&env, &mut pool, &mut vintage, user, e18(10), U256::zero());

    env.set_caller(user);
    // mismatched parallel arrays
    assert!(pool
        .try_redeem_in(vec![*vintage.address()], vec![None, None], vec![e18(1)], U256::zero())
        .is_err());
    // empty batch
    assert!(pool
        .try_redeem_in(vec![], vec![], vec![], U256::zero())
        .is_err());
    // zero amount entry
    assert!(pool
        .try_redeem_out(vec![*vintage.address()], vec![None], vec![U256::zero()], U256::zero())
        .is_err());
}

#[test]
fn test_admin_transfer() {
    let (env, mut pool, _) = setup(1_000, false);
    let new_admin = env.get_account(2);

    pool.transfer_admin(new_admin);
    assert_eq!(pool.get_admin(), new_admin);
    // the old admin lost its rights
    assert!(pool.try_pause().is_err());

    env.set_caller(new_admin);
    pool.pause();
    assert!(pool.is_paused());
}

#[test]
fn test_fee_free_round_trip_is_exact() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage = deploy_vintage(&env, "VCS-A", 18);
    let user = env.get_account(1);

    deposit_as(&env, &mut pool, &mut vintage, user, e18(100), U256::zero());

    env.set_caller(user);
    let released = pool.redeem_in(
        vec![*vintage.address()],
        vec![None],
        vec![e18(100)],
        U256::zero(),
    );

    // without a fee policy the round trip is exact
    assert_eq!(released, vec![e18(100)]);
    assert_eq!(vintage.balance_of(user, None), e18(100));
    assert_eq!(pool.balance_of(user), U256::zero());
    assert_eq!(pool.total_supply(), U256::zero());
    assert_eq!(pool.total_pooled(), U256::zero());
    assert_eq!(pool.project_pooled(String::from("VCS-A")), U256::zero());
}

#[test]
fn test_supply_conservation_through_lifecycle() {
    let (env, mut pool, _) = setup(1_000, false);
    let mut vintage_a = deploy_vintage(&env, "VCS-A", 18);
    let mut vintage_b = deploy_vintage(&env, "VCS-B", 18);
    let user = env.get_account(1);
    pool.set_fixed_fee_policy(Some(fee_config(&env)));
    pool.set_asset_fee_exemption(*vintage_b.address(), true);

    deposit_as(&env, &mut pool, &mut vintage_a, user, e18(100), U256::zero());
    assert_eq!(pool.total_supply(), pool.total_pooled());

    deposit_as(&env, &mut pool, &mut vintage_b, user, e18(50), U256::zero());
    assert_eq!(pool.total_supply(), pool.total_pooled());
    assert_eq!(
        pool.total_pooled(),
        pool.project_pooled(String::from("VCS-A")) + pool.project_pooled(String::from("VCS-B"))
    );

    env.set_caller(user);
    pool.redeem_in(
        vec![*vintage_a.address()],
        vec![None],
        vec![e18(40)],
        bp_of(e18(40), 250),
    );
    assert_eq!(pool.total_supply(), pool.total_pooled());

    pool.redeem_and_retire(
        vec![*vintage_a.address()],
        vec![None],
        vec![e18(20)],
        bp_of(e18(20), 100),
    );
    assert_eq!(pool.total_supply(), pool.total_pooled());

    pool.redeem_and_burn(*vintage_b.address(), None, e18(25));
    assert_eq!(pool.total_supply(), pool.total_pooled());
    assert_eq!(
        pool.total_pooled(),
        pool.project_pooled(String::from("VCS-A")) + pool.project_pooled(String::from("VCS-B"))
    );
}
