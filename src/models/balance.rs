use std::str::FromStr;

use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::models::{Category, Chain, Entity};

/// A token with a resolved amount, nested inside a [`Balance`] as one of its
/// underlyings or rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub chain: Chain,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub amount: U256,
}

impl TokenAmount {
    pub fn new(token: &Entity, amount: U256) -> Self {
        Self {
            chain: token.chain,
            address: token.address,
            decimals: token.decimals,
            symbol: token.symbol.clone(),
            amount,
        }
    }

    pub fn formatted_amount(&self) -> BigDecimal {
        format_units(self.amount, self.decimals)
    }
}

/// Terminal output of a resolution pass: an entity plus the amount the user
/// holds or owes in it.
///
/// Built explicitly from an [`Entity`]; fields are never inherited implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub chain: Chain,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub amount: U256,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub underlyings: Vec<TokenAmount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewards: Vec<TokenAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimable: Option<U256>,
}

impl Balance {
    pub fn new(entity: &Entity, amount: U256, category: Category) -> Self {
        Self {
            chain: entity.chain,
            address: entity.address,
            decimals: entity.decimals,
            symbol: entity.symbol.clone(),
            amount,
            category,
            underlyings: Vec::new(),
            rewards: Vec::new(),
            unlock_at: None,
            claimable: None,
        }
    }

    pub fn with_underlyings(mut self, underlyings: Vec<TokenAmount>) -> Self {
        self.underlyings = underlyings;
        self
    }

    pub fn with_rewards(mut self, rewards: Vec<TokenAmount>) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_unlock(mut self, unlock_at: u64, claimable: U256) -> Self {
        self.unlock_at = Some(unlock_at);
        self.claimable = Some(claimable);
        self
    }

    /// True when neither the principal nor any reward carries value.
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero() && self.rewards.iter().all(|r| r.amount.is_zero())
    }

    /// Amount scaled by `decimals`, for display only.
    pub fn formatted_amount(&self) -> BigDecimal {
        format_units(self.amount, self.decimals)
    }
}

/// `amount / 10^decimals` as an exact decimal.
pub fn format_units(amount: U256, decimals: u8) -> BigDecimal {
    BigDecimal::from_str(&format!("{}e-{}", amount, decimals)).unwrap_or_else(|_| BigDecimal::zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> Entity {
        Entity::token(Chain::Ethereum, Address::repeat_byte(0xaa), 18, "yvUSDC")
    }

    #[test]
    fn test_new_copies_entity_fields() {
        let balance = Balance::new(&vault(), U256::from(5u64), Category::Farm);

        assert_eq!(balance.symbol, "yvUSDC");
        assert_eq!(balance.decimals, 18);
        assert_eq!(balance.category, Category::Farm);
        assert!(balance.underlyings.is_empty());
        assert!(balance.unlock_at.is_none());
    }

    #[test]
    fn test_format_units() {
        let amount = U256::from(1_500_000u64);
        assert_eq!(format_units(amount, 6), BigDecimal::from_str("1.5").unwrap());
        assert_eq!(format_units(U256::ZERO, 18), BigDecimal::zero());
    }

    #[test]
    fn test_is_empty_considers_rewards() {
        let reward_token = Entity::token(Chain::Ethereum, Address::repeat_byte(0xbb), 18, "CRV");
        let empty = Balance::new(&vault(), U256::ZERO, Category::Stake);
        assert!(empty.is_empty());

        let with_reward = empty
            .clone()
            .with_rewards(vec![TokenAmount::new(&reward_token, U256::from(1u64))]);
        assert!(!with_reward.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let balance = Balance::new(&vault(), U256::from(10u64), Category::Lock)
            .with_unlock(1_700_000_000, U256::ZERO);
        let json = serde_json::to_value(&balance).unwrap();

        assert_eq!(json["category"], "lock");
        assert_eq!(json["unlockAt"], 1_700_000_000u64);
        assert!(json.get("underlyings").is_none());
        assert!(json.get("claimable").is_some());
    }
}
