use alloy::primitives::U256;

/// Amount withdrawable from a lock at `now`.
///
/// A lock is claimable strictly after its unlock time: at `now == unlock_at`
/// nothing is claimable yet.
pub fn claimable(amount: U256, unlock_at: u64, now: u64) -> U256 {
    if now > unlock_at {
        amount
    } else {
        U256::ZERO
    }
}

/// Clamp a contract-reported timestamp to seconds that fit a `u64`.
pub fn timestamp_from_u256(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
