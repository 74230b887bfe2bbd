use async_trait::async_trait;

use crate::adapters::abi::{IERC4626, IERC20};
use crate::adapters::traits::BalanceResolver;
use crate::error::EngineError;
use crate::models::{BalancesContext, Balance, Category, Entity, TokenAmount};
use crate::multicall::{BatchDispatcher, CallSpec};

/// ERC4626 share vaults: share balance first, then `convertToAssets` on the
/// shares actually held.
pub struct VaultResolver {
    name: String,
    vaults: Vec<Entity>,
}

impl VaultResolver {
    pub fn new(name: impl Into<String>, vaults: Vec<Entity>) -> Self {
        Self {
            name: name.into(),
            vaults,
        }
    }
}

/// One record per vault with a non-zero share balance, whose single
/// underlying carries the converted asset amount.
///
/// The conversion batch depends on the share batch: vaults whose share read
/// failed or returned zero get no conversion call at all.
pub async fn get_vault_balances(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    vaults: &[Entity],
) -> Result<Vec<Balance>, EngineError> {
    let share_calls = vaults
        .iter()
        .map(|vault| CallSpec::new(vault.address, IERC20::balanceOfCall { account: ctx.address }))
        .collect();
    let shares = dispatcher.execute(ctx, share_calls).await?;

    let convert_calls = shares
        .into_iter()
        .map(|outcome| {
            let target = outcome.input().target;
            outcome
                .into_output()
                .filter(|balance| !balance._0.is_zero())
                .map(|balance| CallSpec::new(target, IERC4626::convertToAssetsCall { shares: balance._0 }))
        })
        .collect();
    let converted = dispatcher.execute_optional(ctx, convert_calls).await?;

    let mut records = Vec::new();
    for (vault, outcome) in vaults.iter().zip(converted) {
        let Some(outcome) = outcome else { continue };
        let shares = outcome.input().params.shares;
        let Some(assets) = outcome.into_output() else { continue };
        let Some(underlying) = vault.underlyings.first() else { continue };

        records.push(
            Balance::new(vault, shares, vault.category.unwrap_or(Category::Farm))
                .with_underlyings(vec![TokenAmount::new(underlying, assets.assets)]),
        );
    }

    Ok(records)
}

#[async_trait]
impl BalanceResolver for VaultResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError> {
        get_vault_balances(ctx, dispatcher, &self.vaults).await
    }
}
