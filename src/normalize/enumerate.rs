use alloy::primitives::U256;
use alloy::sol_types::SolCall;
use tracing::warn;

use crate::error::EngineError;
use crate::models::BalancesContext;
use crate::multicall::{BatchDispatcher, CallSpec};

/// Read a count, then fetch that many indexed items in one batch.
///
/// A failed count call ends the pipeline without issuing the fetch batch.
/// Counts above `max_enumerated_positions` are clamped. Only successful
/// fetches are returned, each with its index.
pub async fn enumerate_then_fetch<N, F, G, B>(
    dispatcher: &BatchDispatcher,
    ctx: &BalancesContext,
    count_call: CallSpec<N>,
    count_of: G,
    build_fetch: B,
) -> Result<Vec<(usize, F::Return)>, EngineError>
where
    N: SolCall + Send + Sync,
    F: SolCall + Send + Sync,
    G: FnOnce(&N::Return) -> U256,
    B: Fn(usize) -> CallSpec<F>,
{
    let target = count_call.target;
    let mut counted = dispatcher.execute(ctx, vec![count_call]).await?;
    let Some(count) = counted.pop().and_then(|outcome| outcome.into_output()) else {
        return Ok(Vec::new());
    };

    let count = clamp_count(count_of(&count), dispatcher.settings().max_enumerated_positions);
    if count.reported > count.used as u128 {
        warn!(
            target_address = %target,
            reported = %count.reported,
            used = count.used,
            "enumerated count clamped"
        );
    }

    let fetches = (0..count.used).map(build_fetch).collect();
    let outcomes = dispatcher.execute(ctx, fetches).await?;

    Ok(outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(index, outcome)| outcome.into_output().map(|output| (index, output)))
        .collect())
}

struct Count {
    reported: u128,
    used: usize,
}

fn clamp_count(reported: U256, max: usize) -> Count {
    let reported = u128::try_from(reported).unwrap_or(u128::MAX);
    let used = usize::try_from(reported).unwrap_or(usize::MAX).min(max);
    Count { reported, used }
}
