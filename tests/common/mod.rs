#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use defi_balance_engine::config::DispatcherSettings;
use defi_balance_engine::multicall::RawCall;
use defi_balance_engine::{BalancesContext, BatchDispatcher, CallError, CallTransport, Chain};

pub const NOW: u64 = 1_700_000_000;

pub fn user() -> Address {
    Address::repeat_byte(0xee)
}

pub fn ctx() -> BalancesContext {
    BalancesContext::new(Chain::Ethereum, user()).at_block(18_000_000).at_time(NOW)
}

/// Scripted in-memory node: answers calls keyed by (target, calldata),
/// reverts on anything it was not told about.
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<RawCall, Result<Bytes, CallError>>,
    fail_aggregate: AtomicBool,
    delay: Option<Duration>,
    round_trips: AtomicUsize,
    seen: Mutex<Vec<RawCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `call` on `target` with already ABI-encoded return data,
    /// typically built with `C::abi_encode_returns(&(..,))`.
    pub fn on<C: SolCall>(mut self, target: Address, call: C, data: Vec<u8>) -> Self {
        self.responses
            .insert(raw(target, &call), Ok(Bytes::from(data)));
        self
    }

    pub fn on_revert<C: SolCall>(mut self, target: Address, call: C, reason: &str) -> Self {
        self.responses.insert(
            raw(target, &call),
            Err(CallError::Reverted { reason: reason.to_string() }),
        );
        self
    }

    pub fn on_transport_error<C: SolCall>(mut self, target: Address, call: C) -> Self {
        self.responses.insert(
            raw(target, &call),
            Err(CallError::Transport("connection reset".to_string())),
        );
        self
    }

    pub fn with_failing_aggregate(self) -> Self {
        self.fail_aggregate.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Number of calls seen with the selector of `C`, across all round trips.
    pub fn calls_to<C: SolCall>(&self) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.calldata.starts_with(&C::SELECTOR))
            .count()
    }

    fn answer(&self, call: &RawCall) -> Result<Bytes, CallError> {
        self.seen.lock().unwrap().push(call.clone());
        self.responses
            .get(call)
            .cloned()
            .unwrap_or_else(|| Err(CallError::Reverted { reason: "unscripted call".to_string() }))
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CallTransport for MockTransport {
    async fn call(&self, _ctx: &BalancesContext, call: &RawCall) -> Result<Bytes, CallError> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.answer(call)
    }

    async fn call_batch(
        &self,
        _ctx: &BalancesContext,
        calls: &[RawCall],
    ) -> Result<Vec<Result<Bytes, CallError>>, CallError> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_aggregate.load(Ordering::SeqCst) {
            return Err(CallError::Transport("aggregate rejected".to_string()));
        }
        Ok(calls.iter().map(|call| self.answer(call)).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn raw<C: SolCall>(target: Address, call: &C) -> RawCall {
    RawCall {
        target,
        calldata: Bytes::from(call.abi_encode()),
    }
}

pub fn dispatcher(transport: Arc<MockTransport>) -> BatchDispatcher {
    dispatcher_with(transport, DispatcherSettings::default())
}

pub fn dispatcher_with(transport: Arc<MockTransport>, settings: DispatcherSettings) -> BatchDispatcher {
    BatchDispatcher::new(transport, settings)
}
