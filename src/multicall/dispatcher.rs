use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::Bytes;
use alloy::sol_types::SolCall;
use futures::future::{join_all, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::DispatcherSettings;
use crate::error::{CallError, EngineError};
use crate::models::BalancesContext;
use crate::multicall::{CallSpec, CallTransport, Outcome, RawCall};

/// Turns a list of typed calls into an index-aligned list of outcomes.
///
/// Calls are split into aggregates of at most `max_batch_size`; up to
/// `max_concurrent_batches` aggregates are in flight at once. Per-call
/// failures become [`Outcome::Failure`]; only malformed input is an `Err`.
#[derive(Clone)]
pub struct BatchDispatcher {
    transport: Arc<dyn CallTransport>,
    settings: DispatcherSettings,
}

impl BatchDispatcher {
    pub fn new(transport: Arc<dyn CallTransport>, settings: DispatcherSettings) -> Self {
        Self { transport, settings }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Execute `calls` at `ctx.block`.
    ///
    /// The result has exactly `calls.len()` entries and entry `i` answers
    /// call `i`. An empty input returns immediately without touching the
    /// transport.
    pub async fn execute<C>(
        &self,
        ctx: &BalancesContext,
        calls: Vec<CallSpec<C>>,
    ) -> Result<Vec<Outcome<C>>, EngineError>
    where
        C: SolCall + Send + Sync,
    {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        for (index, call) in calls.iter().enumerate() {
            call.validate(index)?;
        }

        let started = Instant::now();
        let raw: Vec<RawCall> = calls.iter().map(CallSpec::encode).collect();
        let results = self.dispatch_raw(ctx, &raw).await;

        let outcomes: Vec<Outcome<C>> = calls
            .into_iter()
            .zip(results)
            .map(|(input, result)| match result.and_then(|data| input.decode_output(&data)) {
                Ok(output) => Outcome::Success { input, output },
                Err(reason) => {
                    metrics::counter!(
                        "balance_engine_call_failures_total",
                        1,
                        "kind" => reason.kind().as_str()
                    );
                    debug!(
                        target_address = %input.target,
                        signature = C::SIGNATURE,
                        reason = %reason,
                        "call failed"
                    );
                    Outcome::Failure { input, reason }
                }
            })
            .collect();

        metrics::counter!("balance_engine_calls_total", outcomes.len() as u64);
        debug!(
            signature = C::SIGNATURE,
            calls = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch executed"
        );

        Ok(outcomes)
    }

    /// Execute a chained batch where some slots have nothing to call,
    /// typically because the call they depend on failed.
    ///
    /// `None` slots are never sent and come back as `None`; the rest are
    /// executed as one batch and placed back at their original index.
    pub async fn execute_optional<C>(
        &self,
        ctx: &BalancesContext,
        calls: Vec<Option<CallSpec<C>>>,
    ) -> Result<Vec<Option<Outcome<C>>>, EngineError>
    where
        C: SolCall + Send + Sync,
    {
        let total = calls.len();
        let mut positions = Vec::with_capacity(total);
        let mut present = Vec::with_capacity(total);
        for (index, call) in calls.into_iter().enumerate() {
            if let Some(call) = call {
                call.validate(index)?;
                positions.push(index);
                present.push(call);
            }
        }

        let outcomes = self.execute(ctx, present).await?;
        let mut slots: Vec<Option<Outcome<C>>> = (0..total).map(|_| None).collect();
        for (index, outcome) in positions.into_iter().zip(outcomes) {
            slots[index] = Some(outcome);
        }
        Ok(slots)
    }

    async fn dispatch_raw(
        &self,
        ctx: &BalancesContext,
        raw: &[RawCall],
    ) -> Vec<Result<Bytes, CallError>> {
        let batch_size = self.settings.max_batch_size.max(1);
        let concurrency = self.settings.max_concurrent_batches.max(1);

        let pending: Vec<BoxFuture<'_, Vec<Result<Bytes, CallError>>>> = raw
            .chunks(batch_size)
            .map(|chunk| self.run_chunk(ctx, chunk).boxed())
            .collect();

        // `buffered` yields in submission order, which keeps chunk results aligned.
        let chunks: Vec<Vec<Result<Bytes, CallError>>> =
            stream::iter(pending).buffered(concurrency).collect().await;

        chunks.into_iter().flatten().collect()
    }

    async fn run_chunk(&self, ctx: &BalancesContext, chunk: &[RawCall]) -> Vec<Result<Bytes, CallError>> {
        metrics::counter!("balance_engine_round_trips_total", 1);
        if let [single] = chunk {
            return vec![self.transport.call(ctx, single).await];
        }

        match self.transport.call_batch(ctx, chunk).await {
            Ok(results) if results.len() == chunk.len() => results,
            Ok(results) => {
                warn!(
                    transport = self.transport.name(),
                    expected = chunk.len(),
                    received = results.len(),
                    "aggregate returned a mismatched result count, retrying calls individually"
                );
                self.run_individually(ctx, chunk).await
            }
            Err(e) => {
                warn!(
                    transport = self.transport.name(),
                    calls = chunk.len(),
                    error = %e,
                    "aggregate call failed, retrying calls individually"
                );
                self.run_individually(ctx, chunk).await
            }
        }
    }

    async fn run_individually(&self, ctx: &BalancesContext, chunk: &[RawCall]) -> Vec<Result<Bytes, CallError>> {
        metrics::counter!("balance_engine_batch_fallbacks_total", 1);
        metrics::counter!("balance_engine_round_trips_total", chunk.len() as u64);
        join_all(chunk.iter().map(|call| self.transport.call(ctx, call))).await
    }
}
