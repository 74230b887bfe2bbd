use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;

use crate::error::{CallError, EngineError};

/// One contract read: where to send it and which typed call to encode.
///
/// `C` is a `sol!`-generated call struct, so the function shape, the input
/// parameters and the decode target of the output are all fixed at compile
/// time. Two specs are equal when target and parameters are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSpec<C> {
    pub target: Address,
    pub params: C,
}

impl<C: SolCall> CallSpec<C> {
    pub fn new(target: Address, params: C) -> Self {
        Self { target, params }
    }

    /// Canonical function signature, e.g. `balanceOf(address)`.
    pub fn signature(&self) -> &'static str {
        C::SIGNATURE
    }

    pub fn selector(&self) -> [u8; 4] {
        C::SELECTOR
    }

    /// Reject calls that can never be meaningful before anything is sent.
    pub fn validate(&self, index: usize) -> Result<(), EngineError> {
        if self.target == Address::ZERO {
            return Err(EngineError::InvalidCall {
                index,
                reason: format!("{} targets the zero address", C::SIGNATURE),
            });
        }
        Ok(())
    }

    pub fn encode(&self) -> RawCall {
        RawCall {
            target: self.target,
            calldata: Bytes::from(self.params.abi_encode()),
        }
    }

    /// Decode raw return data into the typed output of `C`.
    ///
    /// Empty return data means the target has no code: a successful
    /// `eth_call` to an account without code returns `0x`.
    pub fn decode_output(&self, data: &[u8]) -> Result<C::Return, CallError> {
        if data.is_empty() {
            return Err(CallError::NoCode);
        }
        C::abi_decode_returns(data, true).map_err(|e| CallError::Decode(e.to_string()))
    }
}

/// ABI-encoded read as the transport sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawCall {
    pub target: Address,
    pub calldata: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use alloy::sol;
    use alloy::sol_types::SolValue;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        interface IToken {
            function balanceOf(address account) external view returns (uint256);
        }
    }

    fn spec() -> CallSpec<IToken::balanceOfCall> {
        CallSpec::new(
            Address::repeat_byte(0x01),
            IToken::balanceOfCall { account: Address::repeat_byte(0x02) },
        )
    }

    #[test]
    fn test_signature_and_selector() {
        let call = spec();
        assert_eq!(call.signature(), "balanceOf(address)");
        assert_eq!(call.selector(), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_encode_prefixes_selector() {
        let raw = spec().encode();
        assert_eq!(raw.target, Address::repeat_byte(0x01));
        assert_eq!(&raw.calldata[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(raw.calldata.len(), 4 + 32);
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(spec(), spec());
        let other = CallSpec::new(
            Address::repeat_byte(0x01),
            IToken::balanceOfCall { account: Address::repeat_byte(0x03) },
        );
        assert_ne!(spec(), other);
    }

    #[test]
    fn test_decode_output() {
        let data = U256::from(250u64).abi_encode();
        let output = spec().decode_output(&data).unwrap();
        assert_eq!(output._0, U256::from(250u64));
    }

    #[test]
    fn test_empty_output_is_no_code() {
        assert_eq!(spec().decode_output(&[]).unwrap_err(), CallError::NoCode);
    }

    #[test]
    fn test_short_output_is_decode_error() {
        let err = spec().decode_output(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, CallError::Decode(_)));
    }

    #[test]
    fn test_zero_target_is_invalid() {
        let call = CallSpec::new(
            Address::ZERO,
            IToken::balanceOfCall { account: Address::repeat_byte(0x02) },
        );
        assert!(matches!(call.validate(3), Err(EngineError::InvalidCall { index: 3, .. })));
        assert!(spec().validate(0).is_ok());
    }
}
