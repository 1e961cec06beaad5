//! Integration test: reward settlement arithmetic.
//!
//! Exercises the payout formulas at their boundaries:
//! 1. Proportional shares scale with deposit size among exact matchers
//! 2. Constant shares split equally per exact-match voter
//! 3. Rates 0 and 100 disable one component each
//! 4. Floor division leaves a remainder that is burned at rotation
//! 5. Principal-only reclaim inside the threshold window
//!
//! This test uses quoin-oracle, quoin-ledger, quoin-crypto, and
//! quoin-types.

use quoin_crypto::blake3;
use quoin_ledger::{Ledger, SupplyId};
use quoin_oracle::{Oracle, OracleConfig};
use quoin_types::{Account, Amount, LevelIndex, Nonce};

const ORACLE_ACCOUNT: Account = [0xaa; 32];

fn voter(tag: u8) -> Account {
    [tag; 32]
}

fn setup(config: OracleConfig) -> (Ledger, Oracle, SupplyId) {
    quoin_integration_tests::init_tracing();
    let mut ledger = Ledger::new();
    let supply = ledger.create_supply(ORACLE_ACCOUNT);
    let oracle = Oracle::new(config, ORACLE_ACCOUNT, &mut ledger, supply).expect("create oracle");
    (ledger, oracle, supply)
}

fn commit_vote(
    ledger: &mut Ledger,
    oracle: &mut Oracle,
    supply: SupplyId,
    account: Account,
    level: LevelIndex,
    salt: Nonce,
    deposit: Amount,
) {
    let cell = ledger
        .create_holder(supply, Some(ORACLE_ACCOUNT))
        .expect("funding cell");
    ledger.mint(ORACLE_ACCOUNT, cell, deposit).expect("fund deposit");
    let digest = blake3::vote_commitment(&account, level, salt);
    assert!(oracle
        .commit(ledger, account, digest, deposit, cell)
        .expect("commit"));
}

fn reclaim(ledger: &mut Ledger, oracle: &mut Oracle, supply: SupplyId, account: Account) -> Amount {
    let dest = ledger
        .create_holder(supply, Some(account))
        .expect("destination");
    oracle.reclaim(ledger, account, dest).expect("reclaim")
}

/// Run one epoch where all voters vote level 2 and reveal honestly, then
/// settle with `mint` injected; returns the oracle mid-reclaim-window.
fn settle_epoch(
    config: OracleConfig,
    votes: &[(u8, Amount)],
    mint: Amount,
) -> (Ledger, Oracle, SupplyId) {
    let (mut ledger, mut oracle, supply) = setup(config);
    for (tag, deposit) in votes {
        commit_vote(
            &mut ledger,
            &mut oracle,
            supply,
            voter(*tag),
            2,
            u64::from(*tag),
            *deposit,
        );
    }
    oracle.advance_phase(&mut ledger, 0).expect("advance");
    for (tag, _) in votes {
        assert!(oracle.reveal(voter(*tag), 2, u64::from(*tag)));
    }
    oracle.advance_phase(&mut ledger, mint).expect("advance");
    assert_eq!(oracle.mode_level(), 2);
    (ledger, oracle, supply)
}

#[test]
fn proportional_share_scales_with_deposit() {
    // Two exact matchers, deposits 30 and 10, pool 80, rate 90.
    // deposit_at_mode = 40, count = 2.
    let config = OracleConfig {
        level_max: 9,
        reclaim_threshold: 1,
        proportional_reward_rate: 90,
    };
    let (mut ledger, mut oracle, supply) = settle_epoch(config, &[(1, 30), (2, 10)], 80);
    assert_eq!(oracle.reward_total(), 80);

    // voter 1: 30 + floor(90*80*30/(100*40)) + floor(10*80/(100*2)) = 88
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(1)), 88);
    // voter 2: 10 + floor(90*80*10/(100*40)) + 4 = 32
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(2)), 32);
}

#[test]
fn rate_zero_splits_pool_equally() {
    let config = OracleConfig {
        level_max: 9,
        reclaim_threshold: 1,
        proportional_reward_rate: 0,
    };
    // Three exact matchers with unequal deposits; pool of 10 from mint.
    let (mut ledger, mut oracle, supply) =
        settle_epoch(config, &[(1, 100), (2, 1), (3, 50)], 10);
    assert_eq!(oracle.reward_total(), 10);

    // Everyone gets deposit + floor(10/3) regardless of deposit size.
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(1)), 103);
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(2)), 4);
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(3)), 53);

    // floor(10/3) * 3 = 9; the rounding remainder of 1 burns at rotation.
    let advance = oracle.advance_phase(&mut ledger, 0).expect("rotate");
    assert_eq!(advance.reclaimed, 1);
}

#[test]
fn rate_hundred_pays_pool_by_deposit_only() {
    let config = OracleConfig {
        level_max: 9,
        reclaim_threshold: 1,
        proportional_reward_rate: 100,
    };
    let (mut ledger, mut oracle, supply) = settle_epoch(config, &[(1, 30), (2, 10)], 20);
    assert_eq!(oracle.reward_total(), 20);

    // voter 1: 30 + floor(100*20*30/(100*40)) = 45; no constant share.
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(1)), 45);
    // voter 2: 10 + floor(100*20*10/(100*40)) = 15
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(2)), 15);

    let advance = oracle.advance_phase(&mut ledger, 0).expect("rotate");
    assert_eq!(advance.reclaimed, 0);
}

#[test]
fn threshold_window_pays_principal_only() {
    let config = OracleConfig {
        level_max: 9,
        reclaim_threshold: 2,
        proportional_reward_rate: 90,
    };
    let (mut ledger, mut oracle, supply) = setup(config);

    // Mode will be 4 (heaviest deposit); 2 and 6 are at the window edge,
    // 1 and 7 just outside.
    commit_vote(&mut ledger, &mut oracle, supply, voter(1), 4, 1, 100);
    commit_vote(&mut ledger, &mut oracle, supply, voter(2), 2, 2, 10);
    commit_vote(&mut ledger, &mut oracle, supply, voter(3), 6, 3, 10);
    commit_vote(&mut ledger, &mut oracle, supply, voter(4), 1, 4, 10);
    commit_vote(&mut ledger, &mut oracle, supply, voter(5), 7, 5, 10);
    oracle.advance_phase(&mut ledger, 0).expect("advance");
    for tag in 1u8..=5 {
        assert!(oracle.reveal(voter(tag), [4, 2, 6, 1, 7][tag as usize - 1], u64::from(tag)));
    }
    oracle.advance_phase(&mut ledger, 0).expect("advance");
    assert_eq!(oracle.mode_level(), 4);
    // reward = 140 - (100 + 10 + 10) + 0 = 20, from the two outsiders.
    assert_eq!(oracle.reward_total(), 20);

    // Window edges reclaim exactly their principal.
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(2)), 10);
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(3)), 10);
    // Outsiders forfeit.
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(4)), 0);
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(5)), 0);
    // The sole exact matcher takes the whole pool on top of its deposit.
    assert_eq!(reclaim(&mut ledger, &mut oracle, supply, voter(1)), 120);
}

#[test]
fn empty_epoch_with_mint_burns_the_pool() {
    let (mut ledger, mut oracle, supply) = setup(OracleConfig::default());

    // Nobody commits; the driver still injects a reward.
    oracle.advance_phase(&mut ledger, 0).expect("advance");
    oracle.advance_phase(&mut ledger, 30).expect("advance");
    assert_eq!(oracle.mode_level(), oracle.config().level_max);
    assert_eq!(oracle.reward_total(), 30);
    assert_eq!(ledger.total_of(supply).expect("total"), 30);

    // Unclaimed, the minted pool burns at rotation: supply returns to 0.
    let advance = oracle.advance_phase(&mut ledger, 0).expect("rotate");
    assert_eq!(advance.reclaimed, 30);
    assert_eq!(ledger.total_of(supply).expect("total"), 0);
}
