use std::future::{self, Future};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::models::{BalancesContext, Balance};
use crate::multicall::BatchDispatcher;

/// A protocol-specific unit of work: builds calls, runs them through the
/// dispatcher and reduces the outcomes into balance records.
#[async_trait]
pub trait BalanceResolver: Send + Sync {
    /// Name used in logs and in resolver errors
    fn name(&self) -> &str;

    /// Resolve every position this resolver knows about for `ctx.address`.
    ///
    /// Per-call failures must be filtered out, not returned; an `Err` is
    /// reserved for faults that make the whole resolver meaningless.
    async fn resolve(
        &self,
        ctx: &BalancesContext,
        dispatcher: &BatchDispatcher,
    ) -> Result<Vec<Balance>, EngineError>;
}

/// Run `resolvers` concurrently under the dispatcher's resolve timeout and
/// flatten their records in resolver order.
pub async fn resolve_balances(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    resolvers: &[Arc<dyn BalanceResolver>],
) -> Result<Vec<Balance>, EngineError> {
    resolve_balances_until(ctx, dispatcher, resolvers, future::pending()).await
}

/// Like [`resolve_balances`], abandoning every in-flight batch as soon as
/// `cancel` completes. Partial results are discarded.
pub async fn resolve_balances_until<F>(
    ctx: &BalancesContext,
    dispatcher: &BatchDispatcher,
    resolvers: &[Arc<dyn BalanceResolver>],
    cancel: F,
) -> Result<Vec<Balance>, EngineError>
where
    F: Future<Output = ()>,
{
    let started = Instant::now();
    let timeout = dispatcher.settings().resolve_timeout();
    let all = join_all(resolvers.iter().map(|resolver| resolver.resolve(ctx, dispatcher)));

    let results = tokio::select! {
        joined = tokio::time::timeout(timeout, all) => {
            joined.map_err(|_| EngineError::Timeout { after: timeout })?
        }
        _ = cancel => return Err(EngineError::Cancelled),
    };

    let mut balances = Vec::new();
    for (resolver, result) in resolvers.iter().zip(results) {
        match result {
            Ok(records) => balances.extend(records),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    resolver = resolver.name(),
                    chain = %ctx.chain,
                    error = %e,
                    "Resolver failed, its positions are omitted"
                );
            }
        }
    }

    let elapsed = started.elapsed();
    metrics::histogram!("balance_engine_resolve_seconds", elapsed.as_secs_f64());
    info!(
        chain = %ctx.chain,
        address = %ctx.address,
        resolvers = resolvers.len(),
        balances = balances.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Balances resolved"
    );

    Ok(balances)
}
