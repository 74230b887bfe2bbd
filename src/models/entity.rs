use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::models::Chain;

/// Closed set of position kinds a balance can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lend,
    Borrow,
    Stake,
    Farm,
    Lock,
    Reward,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Lend,
        Category::Borrow,
        Category::Stake,
        Category::Farm,
        Category::Lock,
        Category::Reward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Lend => "lend",
            Category::Borrow => "borrow",
            Category::Stake => "stake",
            Category::Farm => "farm",
            Category::Lock => "lock",
            Category::Reward => "reward",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// A position-bearing contract (vault, staking pool, locker) or a plain token,
/// before any amount has been resolved.
///
/// `underlyings` and `rewards` are owned copies so every record built from
/// this entity can be resolved independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub chain: Chain,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Share/LP token held by the contract when it differs from `address`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Address>,
    /// Pool whose reserves back the share token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub underlyings: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewards: Vec<Entity>,
}

impl Entity {
    /// Plain ERC20 token descriptor.
    pub fn token(chain: Chain, address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            chain,
            address,
            decimals,
            symbol: symbol.into(),
            category: None,
            token: None,
            pool: None,
            underlyings: Vec::new(),
            rewards: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_underlyings(mut self, underlyings: Vec<Entity>) -> Self {
        self.underlyings = underlyings;
        self
    }

    pub fn with_rewards(mut self, rewards: Vec<Entity>) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_token(mut self, token: Address) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_pool(mut self, pool: Address) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Address to read share balances and total supply from.
    pub fn share_token(&self) -> Address {
        self.token.unwrap_or(self.address)
    }
}
