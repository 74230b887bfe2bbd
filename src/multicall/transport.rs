use alloy::primitives::Bytes;
use async_trait::async_trait;
use futures::future::join_all;

use crate::error::CallError;
use crate::models::BalancesContext;
use crate::multicall::RawCall;

/// Node access seam of the dispatcher.
///
/// Implementations deal in raw calldata only; typing, validation and
/// decoding stay in [`BatchDispatcher`](crate::multicall::BatchDispatcher).
#[async_trait]
pub trait CallTransport: Send + Sync {
    /// Execute one read at `ctx.block`. Empty bytes means the target has
    /// no code.
    async fn call(&self, ctx: &BalancesContext, call: &RawCall) -> Result<Bytes, CallError>;

    /// Execute several reads in a single round trip.
    ///
    /// The outer `Err` means the aggregate itself failed and nothing is
    /// known about the individual calls. The default issues each call
    /// separately, concurrently.
    async fn call_batch(
        &self,
        ctx: &BalancesContext,
        calls: &[RawCall],
    ) -> Result<Vec<Result<Bytes, CallError>>, CallError> {
        Ok(join_all(calls.iter().map(|call| self.call(ctx, call))).await)
    }

    /// Name used in logs.
    fn name(&self) -> &str;
}
