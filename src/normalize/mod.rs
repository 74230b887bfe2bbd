//! Protocol-agnostic transformations from call outputs to balance records.

pub mod enumerate;
pub mod filter;
pub mod lock;
pub mod proportional;
pub mod rewards;

pub use enumerate::enumerate_then_fetch;
pub use filter::{first_successful, retain_non_zero};
pub use lock::{claimable, timestamp_from_u256};
pub use proportional::{one_to_one_underlyings, split_proportional, split_underlyings};
pub use rewards::{attach_rewards, probe_reward_tokens, take_until_failure, REWARD_TOKEN_PROBE_CAP};
