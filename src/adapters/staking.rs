use alloy::primitives::Address;
use async_trait::async_trait;

use crate::adapters::abi::IERC20;
use crate::adapters::rewards::{get_pending_rewards, EarnedReader};
use crate::adapters::traits::BalanceResolver;
use crate::error::EngineError;
use crate::models::{BalancesContext, Balance, Category, Entity};
use crate::multicall::{BatchDispatcher, CallSpec};
use crate::normalize::{one_to_one_underlyings, retain_non_zero};

/// Staking contracts paying rewards on the staked balance.
///
/// Each pool entity carries its staked token in `underlyings` and the tokens
/// it pays in `rewards`. The staked amount and the pending rewards are read
/// in the same round of batches; `earned` says how the pool reports them.
pub struct StakingResolver {
    name: String,
    pools: Vec<Entity>,
    earned: EarnedReader,
}

impl StakingResolver {
    pub fn new(name: impl Into<String>, pools: Vec<Entity>) -> Self {
        Self {
            name: name.into(),
            pools,
            earned: EarnedReader::default(),
        }
    }

    pub fn with_earned(mut self, earned: EarnedReader) -> Self {
        self.earned = earned;
        self
    }
}

/// Stake records for `pools`; a pool whose balance read fails is dropped and
/// a failed reward read leaves the record without those rewards.
pub async fn get_staking_balances(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    pools: &[Entity],
    earned: EarnedReader,
) -> Result<Vec<Balance>, EngineError> {
    let balance_calls = pools
        .iter()
        .map(|pool| CallSpec::new(pool.address, IERC20::balanceOfCall { account: ctx.address }))
        .collect();
    let sources: Vec<(Address, &[Entity])> = pools
        .iter()
        .map(|pool| (pool.address, pool.rewards.as_slice()))
        .collect();

    let (balances, pending) = futures::try_join!(
        dispatcher.execute(ctx, balance_calls),
        get_pending_rewards(ctx, dispatcher, earned, &sources),
    )?;

    let records = pools
        .iter()
        .zip(balances.into_iter().zip(pending))
        .filter_map(|(pool, (balance, rewards))| {
            let amount = balance.into_output()?._0;

            Some(
                Balance::new(pool, amount, pool.category.unwrap_or(Category::Stake))
                    .with_underlyings(one_to_one_underlyings(&pool.underlyings, amount))
                    .with_rewards(rewards),
            )
        })
        .collect();

    Ok(retain_non_zero(records))
}

#[async_trait]
impl BalanceResolver for StakingResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError> {
        get_staking_balances(ctx, dispatcher, &self.pools, self.earned).await
    }
}
