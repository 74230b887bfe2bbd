use std::time::Duration;

use alloy::{
    primitives::{address, Address, Bytes},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionRequest,
    sol,
    sol_types::{decode_revert_reason, SolCall},
    transports::{
        http::{Client, Http},
        RpcError, TransportErrorKind,
    },
};
use async_trait::async_trait;

use crate::config::BlockchainSettings;
use crate::error::{with_retry, CallError, EngineError, RetryConfig};
use crate::models::{BalancesContext, Chain};
use crate::multicall::{CallTransport, RawCall};

/// Multicall3 is deployed at the same address on every supported chain.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

sol! {
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Call3Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Call3Result[] memory returnData);
    }
}

/// JSON-RPC transport for one chain.
///
/// Single reads go out as `eth_call`; batches are folded into one Multicall3
/// `aggregate3` call with `allowFailure` set, so a revert stays local to its
/// slot. Every request is retried on network failures only.
#[derive(Debug, Clone)]
pub struct RpcTransport {
    provider: RootProvider<Http<Client>>,
    chain: Chain,
    rpc_url: String,
    multicall: Address,
    request_timeout: Duration,
    retry: RetryConfig,
}

impl RpcTransport {
    /// Create a transport for `chain` from the configured endpoint.
    pub fn new(chain: Chain, settings: &BlockchainSettings, retry: RetryConfig) -> Result<Self, EngineError> {
        let rpc_url = settings
            .rpc_url(chain)
            .ok_or_else(|| EngineError::Config(format!("No RPC URL configured for {}", chain)))?;
        let provider = ProviderBuilder::new().on_http(rpc_url.parse()?);

        tracing::info!(
            chain = %chain,
            rpc_url = %rpc_url,
            multicall = %settings.multicall_address,
            "RPC transport created"
        );

        Ok(Self {
            provider,
            chain,
            rpc_url: rpc_url.to_string(),
            multicall: settings.multicall_address,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            retry,
        })
    }

    async fn eth_call(&self, ctx: &BalancesContext, to: Address, input: Bytes) -> Result<Bytes, CallError> {
        let request = TransactionRequest::default().to(to).input(input.into());
        let call = self.provider.call(&request).block(ctx.block);

        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(e)) => Err(classify_rpc_error(e)),
            Err(_) => Err(CallError::Transport(format!(
                "request to {} timed out after {:?}",
                self.rpc_url, self.request_timeout
            ))),
        }
    }
}

#[async_trait]
impl CallTransport for RpcTransport {
    async fn call(&self, ctx: &BalancesContext, call: &RawCall) -> Result<Bytes, CallError> {
        with_retry("eth_call", &self.retry, || {
            self.eth_call(ctx, call.target, call.calldata.clone())
        })
        .await
    }

    async fn call_batch(
        &self,
        ctx: &BalancesContext,
        calls: &[RawCall],
    ) -> Result<Vec<Result<Bytes, CallError>>, CallError> {
        let aggregate = IMulticall3::aggregate3Call {
            calls: calls
                .iter()
                .map(|call| IMulticall3::Call3 {
                    target: call.target,
                    allowFailure: true,
                    callData: call.calldata.clone(),
                })
                .collect(),
        };
        let input = Bytes::from(aggregate.abi_encode());

        let data = with_retry("aggregate3", &self.retry, || {
            self.eth_call(ctx, self.multicall, input.clone())
        })
        .await?;

        if data.is_empty() {
            return Err(CallError::NoCode);
        }

        let decoded = IMulticall3::aggregate3Call::abi_decode_returns(&data, true)
            .map_err(|e| CallError::Decode(format!("aggregate3 output: {}", e)))?;

        tracing::debug!(
            chain = %self.chain,
            calls = calls.len(),
            "aggregate3 round trip completed"
        );

        Ok(decoded
            .returnData
            .into_iter()
            .map(|result| {
                if result.success {
                    Ok(result.returnData)
                } else {
                    Err(CallError::Reverted {
                        reason: decode_revert_reason(&result.returnData)
                            .unwrap_or_else(|| "execution reverted".to_string()),
                    })
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        self.chain.name()
    }
}

/// Node-reported execution errors are reverts; everything else is transport.
fn classify_rpc_error(err: RpcError<TransportErrorKind>) -> CallError {
    match err {
        RpcError::ErrorResp(payload) => {
            if payload.code == 3 || payload.message.to_lowercase().contains("revert") {
                CallError::Reverted {
                    reason: payload.message.to_string(),
                }
            } else {
                CallError::Transport(format!("RPC error {}: {}", payload.code, payload.message))
            }
        }
        other => CallError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_resp(code: i64, message: &str) -> RpcError<TransportErrorKind> {
        let payload = serde_json::json!({ "code": code, "message": message }).to_string();
        RpcError::ErrorResp(serde_json::from_str(&payload).unwrap())
    }

    #[test]
    fn test_execution_errors_are_reverts() {
        assert!(matches!(
            classify_rpc_error(error_resp(3, "execution reverted: paused")),
            CallError::Reverted { .. }
        ));
        assert!(matches!(
            classify_rpc_error(error_resp(-32000, "execution reverted")),
            CallError::Reverted { .. }
        ));
    }

    #[test]
    fn test_other_errors_are_transport() {
        let err = classify_rpc_error(error_resp(-32005, "limit exceeded"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_rpc_url_is_config_error() {
        let settings = BlockchainSettings::default();
        let result = RpcTransport::new(Chain::Fantom, &settings, RetryConfig::none());
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_invalid_rpc_url_is_config_error() {
        let mut settings = BlockchainSettings::default();
        settings
            .rpc_urls
            .insert("ethereum".to_string(), "not a url".to_string());
        let result = RpcTransport::new(Chain::Ethereum, &settings, RetryConfig::none());
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
