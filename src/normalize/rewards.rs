use alloy::primitives::U256;
use alloy::sol_types::SolCall;

use crate::error::EngineError;
use crate::models::{BalancesContext, Entity, TokenAmount};
use crate::multicall::{BatchDispatcher, CallSpec, Outcome};

/// Highest number of reward token slots probed on contracts that expose
/// `rewardTokens(i)` without a length getter.
pub const REWARD_TOKEN_PROBE_CAP: usize = 7;

/// Probe indices `0..REWARD_TOKEN_PROBE_CAP` in a single batch and keep
/// outputs up to, not including, the first failing index.
pub async fn probe_reward_tokens<C, B>(
    dispatcher: &BatchDispatcher,
    ctx: &BalancesContext,
    build: B,
) -> Result<Vec<C::Return>, EngineError>
where
    C: SolCall + Send + Sync,
    B: Fn(usize) -> CallSpec<C>,
{
    let calls = (0..REWARD_TOKEN_PROBE_CAP).map(build).collect();
    let outcomes = dispatcher.execute(ctx, calls).await?;
    Ok(take_until_failure(outcomes))
}

/// Successful outputs of the leading run of successes.
pub fn take_until_failure<C: SolCall>(outcomes: Vec<Outcome<C>>) -> Vec<C::Return> {
    outcomes
        .into_iter()
        .map_while(Outcome::into_output)
        .collect()
}

/// Attach earned amounts to reward tokens, index by index.
///
/// Rewards stay a sibling list of the principal; they are never added into
/// the principal amount.
pub fn attach_rewards(rewards: &[Entity], earned: &[U256]) -> Vec<TokenAmount> {
    rewards
        .iter()
        .zip(earned)
        .map(|(token, amount)| TokenAmount::new(token, *amount))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;
    use crate::models::Chain;
    use alloy::primitives::Address;
    use alloy::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        interface IRewarder {
            function rewardTokens(uint256 index) external view returns (address);
        }
    }

    type Probe = IRewarder::rewardTokensCall;

    fn outcome(index: u64, ok: bool) -> Outcome<Probe> {
        let input = CallSpec::new(Address::repeat_byte(1), Probe { index: U256::from(index) });
        if ok {
            Outcome::Success {
                input,
                output: IRewarder::rewardTokensReturn { _0: Address::repeat_byte(index as u8 + 0x10) },
            }
        } else {
            Outcome::Failure {
                input,
                reason: CallError::Reverted { reason: "index out of range".to_string() },
            }
        }
    }

    #[test]
    fn test_take_until_first_failure() {
        let outcomes = vec![outcome(0, true), outcome(1, true), outcome(2, false), outcome(3, true)];
        let tokens: Vec<Address> = take_until_failure(outcomes).into_iter().map(|r| r._0).collect();

        assert_eq!(tokens, vec![Address::repeat_byte(0x10), Address::repeat_byte(0x11)]);
    }

    #[test]
    fn test_leading_failure_yields_nothing() {
        assert!(take_until_failure(vec![outcome(0, false), outcome(1, true)]).is_empty());
    }

    #[test]
    fn test_attach_rewards_keeps_order() {
        let crv = Entity::token(Chain::Ethereum, Address::repeat_byte(0xc), 18, "CRV");
        let cvx = Entity::token(Chain::Ethereum, Address::repeat_byte(0xd), 18, "CVX");
        let earned = [U256::from(3u64), U256::from(4u64)];

        let rewards = attach_rewards(&[crv.clone(), cvx.clone()], &earned);

        assert_eq!(rewards[0], TokenAmount::new(&crv, U256::from(3u64)));
        assert_eq!(rewards[1], TokenAmount::new(&cvx, U256::from(4u64)));
    }
}
