pub mod abi;
pub mod erc20;
pub mod lending;
pub mod locker;
pub mod pool;
pub mod rewards;
pub mod staking;
pub mod traits;
pub mod vault;

pub use erc20::{get_balances_of, get_erc20_details, Erc20Resolver};
pub use lending::{CollateralMarketResolver, Incentives};
pub use locker::{RedeemLockerResolver, SlotLockerResolver};
pub use pool::LpPoolResolver;
pub use rewards::{get_pending_rewards, EarnedReader, RewardSource};
pub use staking::StakingResolver;
pub use traits::*;
pub use vault::VaultResolver;
