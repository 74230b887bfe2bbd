use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tracing::debug;

use crate::adapters::abi::{IPoolRegistry, IERC20};
use crate::adapters::rewards::{get_pending_rewards, EarnedReader};
use crate::adapters::traits::BalanceResolver;
use crate::error::EngineError;
use crate::models::{BalancesContext, Balance, Category, Entity};
use crate::multicall::{BatchDispatcher, CallSpec};
use crate::normalize::{first_successful, split_underlyings};

/// Liquidity positions resolved into their underlying tokens through a pool
/// registry.
///
/// For every pool entity: the user's share balance is read from `address`,
/// the share supply from `share_token()`, and the reserves from the registry
/// for `pool` (falling back to `address`). Reserves come from
/// `get_balances`, or from the legacy `get_underlying_balances` when the
/// primary getter fails. Pools that declare `rewards` also get their pending
/// rewards from `address`, read as `earned` says.
pub struct LpPoolResolver {
    name: String,
    registry: Address,
    pools: Vec<Entity>,
    earned: EarnedReader,
}

impl LpPoolResolver {
    pub fn new(name: impl Into<String>, registry: Address, pools: Vec<Entity>) -> Self {
        Self {
            name: name.into(),
            registry,
            pools,
            earned: EarnedReader::default(),
        }
    }

    pub fn with_earned(mut self, earned: EarnedReader) -> Self {
        self.earned = earned;
        self
    }
}

pub async fn get_pool_balances(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    registry: Address,
    pools: &[Entity],
    earned: EarnedReader,
) -> Result<Vec<Balance>, EngineError> {
    let balance_calls = pools
        .iter()
        .map(|pool| CallSpec::new(pool.address, IERC20::balanceOfCall { account: ctx.address }))
        .collect();
    let supply_calls = pools
        .iter()
        .map(|pool| CallSpec::new(pool.share_token(), IERC20::totalSupplyCall {}))
        .collect();
    let primary_calls = pools
        .iter()
        .map(|pool| {
            CallSpec::new(registry, IPoolRegistry::get_balancesCall { pool: pool.pool.unwrap_or(pool.address) })
        })
        .collect();
    let legacy_calls = pools
        .iter()
        .map(|pool| {
            CallSpec::new(
                registry,
                IPoolRegistry::get_underlying_balancesCall { pool: pool.pool.unwrap_or(pool.address) },
            )
        })
        .collect();

    let sources: Vec<(Address, &[Entity])> = pools
        .iter()
        .map(|pool| (pool.address, pool.rewards.as_slice()))
        .collect();

    let (balances, supplies, primary, legacy, pending) = futures::try_join!(
        dispatcher.execute(ctx, balance_calls),
        dispatcher.execute(ctx, supply_calls),
        dispatcher.execute(ctx, primary_calls),
        dispatcher.execute(ctx, legacy_calls),
        get_pending_rewards(ctx, dispatcher, earned, &sources),
    )?;

    let mut records = Vec::new();
    let rows = pools
        .iter()
        .zip(balances)
        .zip(supplies)
        .zip(primary.into_iter().zip(legacy))
        .zip(pending);

    for ((((pool, balance), supply), (primary, legacy)), rewards) in rows {
        let Some(amount) = balance.into_output().map(|b| b._0) else { continue };
        if amount.is_zero() {
            continue;
        }
        let Some(total_supply) = supply.into_output().map(|s| s._0) else { continue };
        let reserves: Option<[U256; 8]> =
            first_successful([primary.into_output().map(|r| r._0), legacy.into_output().map(|r| r._0)]);
        let Some(reserves) = reserves else { continue };

        match split_underlyings(&pool.underlyings, amount, total_supply, &reserves) {
            Some(underlyings) => records.push(
                Balance::new(pool, amount, pool.category.unwrap_or(Category::Farm))
                    .with_underlyings(underlyings)
                    .with_rewards(rewards),
            ),
            None => debug!(
                pool = %pool.address,
                total_supply = %total_supply,
                "pool skipped, reserves cannot be split"
            ),
        }
    }

    Ok(records)
}

#[async_trait]
impl BalanceResolver for LpPoolResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError> {
        get_pool_balances(ctx, dispatcher, self.registry, &self.pools, self.earned).await
    }
}
