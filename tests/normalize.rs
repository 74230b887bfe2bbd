mod common;

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use proptest::prelude::*;

use common::{ctx, dispatcher, MockTransport, NOW};
use defi_balance_engine::adapters::abi::IMultiRewarder;
use defi_balance_engine::normalize::{
    claimable, probe_reward_tokens, split_proportional, REWARD_TOKEN_PROBE_CAP,
};
use defi_balance_engine::CallSpec;

type RewardTokens = IMultiRewarder::rewardTokensCall;

fn u(value: u64) -> U256 {
    U256::from(value)
}

#[test]
fn test_split_proportional_reference_values() {
    assert_eq!(split_proportional(u(100), u(1000), &[u(500), u(2000)]), Some(vec![u(50), u(200)]));
    assert_eq!(split_proportional(u(100), U256::ZERO, &[u(500), u(2000)]), None);
}

proptest! {
    #[test]
    fn prop_split_is_floor_of_exact_share(
        amount in any::<u64>(),
        total_supply in 1u64..,
        reserves in prop::collection::vec(any::<u64>(), 0..8),
    ) {
        let reserves_u256: Vec<U256> = reserves.iter().map(|r| u(*r)).collect();
        let shares = split_proportional(u(amount), u(total_supply), &reserves_u256).unwrap();

        prop_assert_eq!(shares.len(), reserves.len());
        for (share, reserve) in shares.iter().zip(&reserves) {
            let exact = (*reserve as u128) * (amount as u128);
            let share = u128::try_from(*share).unwrap();
            prop_assert!(share * (total_supply as u128) <= exact);
            prop_assert!(exact < (share + 1) * (total_supply as u128));
        }
    }

    #[test]
    fn prop_split_never_exceeds_reserve_when_amount_within_supply(
        total_supply in 1u64..,
        fraction in 0.0f64..=1.0,
        reserve in any::<u64>(),
    ) {
        let amount = ((total_supply as f64) * fraction) as u64;
        let amount = amount.min(total_supply);
        let shares = split_proportional(u(amount), u(total_supply), &[u(reserve)]).unwrap();
        prop_assert!(shares[0] <= u(reserve));
    }
}

#[test]
fn test_unlock_boundary() {
    let amount = u(1_000);
    assert_eq!(claimable(amount, NOW, NOW + 1), amount);
    assert_eq!(claimable(amount, NOW, NOW - 1), U256::ZERO);
    assert_eq!(claimable(amount, NOW, NOW), U256::ZERO);
}

fn reward_token(i: u64) -> Address {
    Address::repeat_byte(0x40 + i as u8)
}

fn probe_mock(rewarder: Address, succeeding: &[u64], reverting: &[u64]) -> MockTransport {
    let mock = succeeding.iter().fold(MockTransport::new(), |mock, i| {
        mock.on(
            rewarder,
            RewardTokens { index: u(*i) },
            RewardTokens::abi_encode_returns(&(reward_token(*i),)),
        )
    });
    reverting.iter().fold(mock, |mock, i| {
        mock.on_revert(rewarder, RewardTokens { index: u(*i) }, "index out of bounds")
    })
}

#[tokio::test]
async fn test_probe_stops_at_first_failing_index() {
    let rewarder = Address::repeat_byte(0x33);
    // index 3 answers again, but the list already ended at 2
    let transport = Arc::new(probe_mock(rewarder, &[0, 1, 3], &[2]));
    let dispatcher = dispatcher(transport.clone());

    let tokens = probe_reward_tokens(&dispatcher, &ctx(), |i| {
        CallSpec::new(rewarder, RewardTokens { index: U256::from(i) })
    })
    .await
    .unwrap();

    let tokens: Vec<Address> = tokens.into_iter().map(|t| t._0).collect();
    assert_eq!(tokens, vec![reward_token(0), reward_token(1)]);
    assert_eq!(transport.calls_to::<RewardTokens>(), REWARD_TOKEN_PROBE_CAP);
    assert_eq!(transport.round_trips(), 1);
}

#[tokio::test]
async fn test_probe_is_bounded_by_cap() {
    let rewarder = Address::repeat_byte(0x34);
    let all: Vec<u64> = (0..10).collect();
    let transport = Arc::new(probe_mock(rewarder, &all, &[]));
    let dispatcher = dispatcher(transport.clone());

    let tokens = probe_reward_tokens(&dispatcher, &ctx(), |i| {
        CallSpec::new(rewarder, RewardTokens { index: U256::from(i) })
    })
    .await
    .unwrap();

    assert_eq!(tokens.len(), REWARD_TOKEN_PROBE_CAP);
    assert_eq!(transport.calls_to::<RewardTokens>(), REWARD_TOKEN_PROBE_CAP);
}
