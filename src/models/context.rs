use alloy::eips::BlockId;
use alloy::primitives::Address;
use chrono::Utc;

use crate::models::Chain;

/// Read-only execution context of one resolution pass.
///
/// Shared by reference across every concurrently running batch; it never
/// changes while a pass is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancesContext {
    pub chain: Chain,
    /// Wallet whose positions are being resolved.
    pub address: Address,
    /// Snapshot every batch of the pass reads from.
    pub block: BlockId,
    /// Unix seconds used for unlock evaluation.
    pub now: u64,
}

impl BalancesContext {
    /// Context reading the latest block, with `now` taken from the wall clock.
    pub fn new(chain: Chain, address: Address) -> Self {
        Self {
            chain,
            address,
            block: BlockId::latest(),
            now: Utc::now().timestamp().max(0) as u64,
        }
    }

    pub fn at_block(mut self, block_number: u64) -> Self {
        self.block = BlockId::number(block_number);
        self
    }

    pub fn at_time(mut self, now: u64) -> Self {
        self.now = now;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pins_block_and_time() {
        let user = Address::repeat_byte(0x11);
        let ctx = BalancesContext::new(Chain::Ethereum, user)
            .at_block(18_000_000)
            .at_time(1_700_000_000);

        assert_eq!(ctx.block, BlockId::number(18_000_000));
        assert_eq!(ctx.now, 1_700_000_000);
        assert_eq!(ctx.address, user);
    }
}
