use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::adapters::abi::IERC20;
use crate::adapters::traits::BalanceResolver;
use crate::config::TokenRegistry;
use crate::error::EngineError;
use crate::models::{BalancesContext, Balance, Category, Entity};
use crate::multicall::{filter_successful, BatchDispatcher, CallSpec};
use crate::normalize::retain_non_zero;

/// Token descriptors for `tokens`, in input order.
///
/// Known tokens come from `registry`; the rest are read with one `symbol()`
/// and one `decimals()` batch. Tokens whose metadata cannot be read are
/// dropped.
pub async fn get_erc20_details(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    registry: &TokenRegistry,
    tokens: &[Address],
) -> Result<Vec<Entity>, EngineError> {
    let unknown: Vec<Address> = tokens
        .iter()
        .copied()
        .filter(|token| registry.get(ctx.chain, *token).is_none())
        .collect();

    let symbol_calls = unknown
        .iter()
        .map(|token| CallSpec::new(*token, IERC20::symbolCall {}))
        .collect();
    let decimals_calls = unknown
        .iter()
        .map(|token| CallSpec::new(*token, IERC20::decimalsCall {}))
        .collect();

    let (symbols, decimals) = futures::try_join!(
        dispatcher.execute(ctx, symbol_calls),
        dispatcher.execute(ctx, decimals_calls),
    )?;

    let mut discovered = TokenRegistry::new();
    for ((token, symbol), decimals) in unknown.iter().zip(symbols).zip(decimals) {
        if let (Some(symbol), Some(decimals)) = (symbol.into_output(), decimals.into_output()) {
            discovered.insert(Entity::token(ctx.chain, *token, decimals._0, symbol._0));
        }
    }

    Ok(tokens
        .iter()
        .filter_map(|token| {
            registry
                .get(ctx.chain, *token)
                .or_else(|| discovered.get(ctx.chain, *token))
                .cloned()
        })
        .collect())
}

/// `balanceOf(ctx.address)` on each token; failed reads are dropped.
pub async fn get_balances_of(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    tokens: &[Entity],
    category: Category,
) -> Result<Vec<Balance>, EngineError> {
    let calls = tokens
        .iter()
        .map(|token| CallSpec::new(token.address, IERC20::balanceOfCall { account: ctx.address }))
        .collect();
    let outcomes = dispatcher.execute(ctx, calls).await?;

    Ok(filter_successful(tokens, outcomes)
        .into_iter()
        .map(|(token, balance)| Balance::new(token, balance._0, category))
        .collect())
}

/// Plain token holdings, e.g. governance tokens held directly in the wallet.
pub struct Erc20Resolver {
    name: String,
    tokens: Vec<Address>,
    category: Category,
    registry: Arc<TokenRegistry>,
}

impl Erc20Resolver {
    pub fn new(
        name: impl Into<String>,
        tokens: Vec<Address>,
        category: Category,
        registry: Arc<TokenRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            tokens,
            category,
            registry,
        }
    }
}

#[async_trait]
impl BalanceResolver for Erc20Resolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError> {
        let tokens = get_erc20_details(ctx, dispatcher, &self.registry, &self.tokens).await?;
        let balances = get_balances_of(ctx, dispatcher, &tokens, self.category).await?;
        Ok(retain_non_zero(balances))
    }
}

