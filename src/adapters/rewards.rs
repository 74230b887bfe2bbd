use alloy::primitives::{Address, U256};
use tracing::warn;

use crate::adapters::abi::{IMultiRewarder, IRewardPool, IStakingRewards};
use crate::error::EngineError;
use crate::models::{BalancesContext, Entity, TokenAmount};
use crate::multicall::{BatchDispatcher, CallSpec, Outcome};
use crate::normalize::attach_rewards;

/// How a rewards contract reports what an account has earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarnedReader {
    /// `earned(account) -> uint256`, paid in the first declared reward token.
    #[default]
    Single,
    /// `earned(account) -> (address token, uint256 amount)[]`, matched to the
    /// declared reward tokens by address.
    List,
    /// `earned(account, token) -> uint256`, one call per declared reward token.
    PerToken,
}

/// A rewards contract and the reward tokens it is declared to pay.
pub type RewardSource<'a> = (Address, &'a [Entity]);

/// Pending rewards of `ctx.address` for every source, aligned with `sources`.
///
/// Sources without declared rewards issue no call. A failed read leaves the
/// source (or, with [`EarnedReader::PerToken`], that token) without rewards.
/// Rewards keep the declared token order.
pub async fn get_pending_rewards(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    reader: EarnedReader,
    sources: &[RewardSource<'_>],
) -> Result<Vec<Vec<TokenAmount>>, EngineError> {
    match reader {
        EarnedReader::Single => get_single_earned(ctx, dispatcher, sources).await,
        EarnedReader::List => get_listed_earned(ctx, dispatcher, sources).await,
        EarnedReader::PerToken => get_per_token_earned(ctx, dispatcher, sources).await,
    }
}

async fn get_single_earned(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    sources: &[RewardSource<'_>],
) -> Result<Vec<Vec<TokenAmount>>, EngineError> {
    let calls = sources
        .iter()
        .map(|(contract, rewards)| {
            (!rewards.is_empty())
                .then(|| CallSpec::new(*contract, IStakingRewards::earnedCall { account: ctx.address }))
        })
        .collect();
    let outcomes = dispatcher.execute_optional(ctx, calls).await?;

    Ok(sources
        .iter()
        .zip(outcomes)
        .map(|((contract, rewards), outcome)| {
            if rewards.len() > 1 {
                warn!(
                    rewards_contract = %contract,
                    declared = rewards.len(),
                    "earned(account) pays one token, extra declared rewards are not read"
                );
            }
            let earned: Vec<U256> = outcome
                .and_then(Outcome::into_output)
                .map(|earned| earned._0)
                .into_iter()
                .collect();
            attach_rewards(rewards, &earned)
        })
        .collect())
}

async fn get_listed_earned(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    sources: &[RewardSource<'_>],
) -> Result<Vec<Vec<TokenAmount>>, EngineError> {
    let calls = sources
        .iter()
        .map(|(contract, rewards)| {
            (!rewards.is_empty())
                .then(|| CallSpec::new(*contract, IRewardPool::earnedCall { account: ctx.address }))
        })
        .collect();
    let outcomes = dispatcher.execute_optional(ctx, calls).await?;

    Ok(sources
        .iter()
        .zip(outcomes)
        .map(|((_, rewards), outcome)| {
            let Some(listed) = outcome.and_then(Outcome::into_output) else {
                return Vec::new();
            };
            rewards
                .iter()
                .filter_map(|token| {
                    listed
                        .claimable
                        .iter()
                        .find(|earned| earned.token == token.address)
                        .map(|earned| TokenAmount::new(token, earned.amount))
                })
                .collect()
        })
        .collect())
}

async fn get_per_token_earned(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    sources: &[RewardSource<'_>],
) -> Result<Vec<Vec<TokenAmount>>, EngineError> {
    let mut owners = Vec::new();
    let mut calls = Vec::new();
    for (index, (contract, rewards)) in sources.iter().enumerate() {
        for token in rewards.iter() {
            owners.push((index, token));
            calls.push(CallSpec::new(
                *contract,
                IMultiRewarder::earnedCall {
                    account: ctx.address,
                    rewardToken: token.address,
                },
            ));
        }
    }
    let outcomes = dispatcher.execute(ctx, calls).await?;

    let mut pending: Vec<Vec<TokenAmount>> = vec![Vec::new(); sources.len()];
    for ((index, token), outcome) in owners.into_iter().zip(outcomes) {
        if let Some(earned) = outcome.into_output() {
            pending[index].push(TokenAmount::new(token, earned._0));
        }
    }
    Ok(pending)
}
