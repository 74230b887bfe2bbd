use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::adapters::abi::{IMultiRewarder, IRedeemLocker, ISlotLocker, IERC20};
use crate::adapters::erc20::get_erc20_details;
use crate::adapters::rewards::{get_pending_rewards, EarnedReader};
use crate::adapters::traits::BalanceResolver;
use crate::config::TokenRegistry;
use crate::error::EngineError;
use crate::models::{BalancesContext, Balance, Category, Entity, TokenAmount};
use crate::multicall::{BatchDispatcher, CallSpec};
use crate::normalize::{
    claimable, enumerate_then_fetch, one_to_one_underlyings, probe_reward_tokens, timestamp_from_u256,
};

/// Lockers holding a principal plus per-user extra lock slots.
///
/// Emits one record for the principal, with rewards from the locker's
/// rewarder, and one record per non-empty slot with its unlock time.
pub struct SlotLockerResolver {
    name: String,
    locker: Entity,
    registry: Arc<TokenRegistry>,
}

impl SlotLockerResolver {
    pub fn new(name: impl Into<String>, locker: Entity, registry: Arc<TokenRegistry>) -> Self {
        Self {
            name: name.into(),
            locker,
            registry,
        }
    }
}

#[async_trait]
impl BalanceResolver for SlotLockerResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError> {
        let (principal, slots) = futures::try_join!(
            get_locker_principal(ctx, dispatcher, &self.registry, &self.locker),
            get_locker_slots(ctx, dispatcher, &self.locker),
        )?;

        Ok(principal.into_iter().chain(slots).collect())
    }
}

/// Principal lock record, or `None` when the balance read fails.
pub async fn get_locker_principal(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    registry: &TokenRegistry,
    locker: &Entity,
) -> Result<Option<Balance>, EngineError> {
    let (balance, rewarder) = futures::try_join!(
        dispatcher.execute(
            ctx,
            vec![CallSpec::new(locker.address, IERC20::balanceOfCall { account: ctx.address })],
        ),
        dispatcher.execute(ctx, vec![CallSpec::new(locker.address, ISlotLocker::rewarderCall {})]),
    )?;

    let Some(amount) = balance.into_iter().next().and_then(|o| o.into_output()).map(|b| b._0) else {
        return Ok(None);
    };

    let rewards = match rewarder.into_iter().next().and_then(|o| o.into_output()) {
        Some(rewarder) if rewarder._0 != Address::ZERO => {
            get_rewarder_rewards(ctx, dispatcher, registry, rewarder._0).await?
        }
        _ => Vec::new(),
    };

    Ok(Some(
        Balance::new(locker, amount, Category::Lock)
            .with_underlyings(one_to_one_underlyings(&locker.underlyings, amount))
            .with_rewards(rewards),
    ))
}

/// Pending rewards of a rewarder that lists its tokens by index only.
pub async fn get_rewarder_rewards(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    registry: &TokenRegistry,
    rewarder: Address,
) -> Result<Vec<TokenAmount>, EngineError> {
    let probed = probe_reward_tokens(dispatcher, ctx, |index| {
        CallSpec::new(rewarder, IMultiRewarder::rewardTokensCall { index: U256::from(index) })
    })
    .await?;
    let addresses: Vec<Address> = probed.into_iter().map(|r| r._0).collect();
    let tokens = get_erc20_details(ctx, dispatcher, registry, &addresses).await?;

    let mut pending =
        get_pending_rewards(ctx, dispatcher, EarnedReader::PerToken, &[(rewarder, tokens.as_slice())]).await?;
    Ok(pending.pop().unwrap_or_default())
}

/// One lock record per non-empty slot; slot reads that fail are skipped.
pub async fn get_locker_slots(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    locker: &Entity,
) -> Result<Vec<Balance>, EngineError> {
    let slots = enumerate_then_fetch(
        dispatcher,
        ctx,
        CallSpec::new(locker.address, ISlotLocker::getUserSlotLengthCall { user: ctx.address }),
        |length| length._0,
        |n| {
            CallSpec::new(
                locker.address,
                ISlotLocker::getUserNthSlotCall {
                    user: ctx.address,
                    n: U256::from(n),
                },
            )
        },
    )
    .await?;

    Ok(slots
        .into_iter()
        .filter(|(_, slot)| !slot.amount.is_zero())
        .map(|(_, slot)| {
            let unlock_at = timestamp_from_u256(slot.endTime);
            Balance::new(locker, slot.amount, Category::Lock)
                .with_underlyings(one_to_one_underlyings(&locker.underlyings, slot.amount))
                .with_unlock(unlock_at, claimable(slot.amount, unlock_at, ctx.now))
        })
        .collect())
}

/// Lockers that vest a redeem request over time: each request locks an
/// amount of the locker token against an amount of the underlying, which
/// becomes claimable after `endTime`.
pub struct RedeemLockerResolver {
    name: String,
    locker: Entity,
}

impl RedeemLockerResolver {
    pub fn new(name: impl Into<String>, locker: Entity) -> Self {
        Self {
            name: name.into(),
            locker,
        }
    }
}

pub async fn get_redeem_balances(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    locker: &Entity,
) -> Result<Vec<Balance>, EngineError> {
    let redeems = enumerate_then_fetch(
        dispatcher,
        ctx,
        CallSpec::new(locker.address, IRedeemLocker::getUserRedeemsLengthCall { user: ctx.address }),
        |length| length._0,
        |index| {
            CallSpec::new(
                locker.address,
                IRedeemLocker::getUserRedeemCall {
                    user: ctx.address,
                    redeemIndex: U256::from(index),
                },
            )
        },
    )
    .await?;

    Ok(redeems
        .into_iter()
        .map(|(_, redeem)| {
            let unlock_at = timestamp_from_u256(redeem.endTime);
            let underlyings = locker
                .underlyings
                .first()
                .map(|token| vec![TokenAmount::new(token, redeem.underlyingAmount)])
                .unwrap_or_default();

            Balance::new(locker, redeem.lockedAmount, Category::Lock)
                .with_underlyings(underlyings)
                .with_unlock(unlock_at, claimable(redeem.underlyingAmount, unlock_at, ctx.now))
        })
        .collect())
}

#[async_trait]
impl BalanceResolver for RedeemLockerResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError> {
        get_redeem_balances(ctx, dispatcher, &self.locker).await
    }
}
