use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::adapters::abi::{IComet, IIncentivesController, IERC20};
use crate::adapters::erc20::get_erc20_details;
use crate::adapters::traits::BalanceResolver;
use crate::config::TokenRegistry;
use crate::error::EngineError;
use crate::models::{BalancesContext, Balance, Category, Entity};
use crate::multicall::{filter_successful, BatchDispatcher, CallSpec, Outcome};
use crate::normalize::{enumerate_then_fetch, retain_non_zero};

/// Incentives controller paying one reward token on lent assets.
#[derive(Debug, Clone)]
pub struct Incentives {
    pub controller: Address,
    pub reward: Entity,
}

/// Lending markets holding per-asset collateral against a single borrowable
/// base asset.
///
/// The market entity's first underlying is its base asset. Collateral assets
/// are enumerated from the market. Emits a lend record for supplied base,
/// one lend record per collateral asset, a borrow record for the base debt
/// and, with [`Incentives`], a reward record.
pub struct CollateralMarketResolver {
    name: String,
    market: Entity,
    registry: Arc<TokenRegistry>,
    incentives: Option<Incentives>,
}

impl CollateralMarketResolver {
    pub fn new(name: impl Into<String>, market: Entity, registry: Arc<TokenRegistry>) -> Self {
        Self {
            name: name.into(),
            market,
            registry,
            incentives: None,
        }
    }

    pub fn with_incentives(mut self, incentives: Incentives) -> Self {
        self.incentives = Some(incentives);
        self
    }
}

#[async_trait]
impl BalanceResolver for CollateralMarketResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError> {
        let Some(base) = self.market.underlyings.first() else {
            return Err(EngineError::Resolver {
                resolver: self.name.clone(),
                message: format!("market {} declares no base asset", self.market.address),
            });
        };

        let assets = get_market_assets(ctx, dispatcher, &self.registry, &self.market).await?;
        let mut balances = get_lend_borrow_balances(ctx, dispatcher, &self.market, base, &assets).await?;

        if let Some(incentives) = &self.incentives {
            let lent: Vec<Address> = balances
                .iter()
                .filter(|balance| balance.category == Category::Lend)
                .map(|balance| balance.address)
                .collect();
            balances.extend(get_incentive_rewards(ctx, dispatcher, incentives, lent).await?);
        }

        Ok(balances)
    }
}

/// Collateral assets listed by `market`, in listing order. Assets whose info
/// or metadata cannot be read are skipped.
pub async fn get_market_assets(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    registry: &TokenRegistry,
    market: &Entity,
) -> Result<Vec<Entity>, EngineError> {
    let infos = enumerate_then_fetch(
        dispatcher,
        ctx,
        CallSpec::new(market.address, IComet::numAssetsCall {}),
        |count| U256::from(count._0),
        |i| CallSpec::new(market.address, IComet::getAssetInfoCall { i: i as u8 }),
    )
    .await?;

    let addresses: Vec<Address> = infos.into_iter().map(|(_, info)| info._0.asset).collect();
    get_erc20_details(ctx, dispatcher, registry, &addresses).await
}

/// Base supply, per-asset collateral and base debt of `ctx.address`.
///
/// The collateral batch and the debt read run concurrently. Collateral
/// outcomes are paired with their asset before failures are dropped.
pub async fn get_lend_borrow_balances(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    market: &Entity,
    base: &Entity,
    assets: &[Entity],
) -> Result<Vec<Balance>, EngineError> {
    let collateral_calls = assets
        .iter()
        .map(|asset| {
            CallSpec::new(
                market.address,
                IComet::userCollateralCall {
                    account: ctx.address,
                    asset: asset.address,
                },
            )
        })
        .collect();
    let supply_call = CallSpec::new(market.address, IERC20::balanceOfCall { account: ctx.address });
    let borrow_call = CallSpec::new(market.address, IComet::borrowBalanceOfCall { account: ctx.address });

    let (collateral, supplied, borrowed) = futures::try_join!(
        dispatcher.execute(ctx, collateral_calls),
        dispatcher.execute(ctx, vec![supply_call]),
        dispatcher.execute(ctx, vec![borrow_call]),
    )?;

    let mut records = Vec::new();
    if let Some(supplied) = supplied.into_iter().next().and_then(Outcome::into_output) {
        records.push(Balance::new(base, supplied._0, Category::Lend));
    }
    records.extend(
        filter_successful(assets, collateral)
            .into_iter()
            .map(|(asset, collateral)| Balance::new(asset, U256::from(collateral.balance), Category::Lend)),
    );
    if let Some(borrowed) = borrowed.into_iter().next().and_then(Outcome::into_output) {
        records.push(Balance::new(base, borrowed._0, Category::Borrow));
    }

    Ok(retain_non_zero(records))
}

/// Reward record for the incentives accrued on `assets`, or `None` when
/// nothing is lent, the read fails or nothing has accrued.
pub async fn get_incentive_rewards(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    incentives: &Incentives,
    assets: Vec<Address>,
) -> Result<Option<Balance>, EngineError> {
    if assets.is_empty() {
        return Ok(None);
    }

    let call = CallSpec::new(
        incentives.controller,
        IIncentivesController::getRewardsBalanceCall {
            assets,
            user: ctx.address,
        },
    );
    let outcomes = dispatcher.execute(ctx, vec![call]).await?;

    Ok(outcomes
        .into_iter()
        .next()
        .and_then(Outcome::into_output)
        .map(|accrued| Balance::new(&incentives.reward, accrued._0, Category::Reward))
        .filter(|balance| !balance.is_empty()))
}
