use std::collections::HashMap;
use std::sync::LazyLock;

use alloy::primitives::{address, Address};

use crate::models::{Chain, Entity};

/// Known token metadata, consulted before reading `symbol()`/`decimals()`
/// on chain.
///
/// Read-only once built; lookups by address and by upper-cased symbol.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_address: HashMap<(Chain, Address), Entity>,
    by_symbol: HashMap<(Chain, String), Address>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared table of well-known tokens.
    pub fn builtin() -> &'static TokenRegistry {
        &BUILTIN_TOKENS
    }

    pub fn insert(&mut self, token: Entity) {
        self.by_symbol
            .insert((token.chain, token.symbol.to_uppercase()), token.address);
        self.by_address.insert((token.chain, token.address), token);
    }

    pub fn get(&self, chain: Chain, address: Address) -> Option<&Entity> {
        self.by_address.get(&(chain, address))
    }

    pub fn by_symbol(&self, chain: Chain, symbol: &str) -> Option<&Entity> {
        self.by_symbol
            .get(&(chain, symbol.to_uppercase()))
            .and_then(|address| self.get(chain, *address))
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

impl FromIterator<Entity> for TokenRegistry {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut registry = TokenRegistry::new();
        for token in iter {
            registry.insert(token);
        }
        registry
    }
}

macro_rules! token_table {
    ( $( ($chain:expr, $sym:literal, $decimals:literal) => $addr:literal ),* $(,)? ) => {
        fn build_builtin_tokens() -> TokenRegistry {
            [
                $( Entity::token($chain, address!($addr), $decimals, $sym), )*
            ]
            .into_iter()
            .collect()
        }
    };
}

token_table! {
    // Ethereum
    (Chain::Ethereum, "USDC", 6) => "A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
    (Chain::Ethereum, "USDT", 6) => "dAC17F958D2ee523a2206206994597C13D831ec7",
    (Chain::Ethereum, "WETH", 18) => "C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
    (Chain::Ethereum, "DAI", 18) => "6B175474E89094C44Da98b954EedeAC495271d0F",
    (Chain::Ethereum, "WBTC", 8) => "2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599",
    (Chain::Ethereum, "CRV", 18) => "D533a949740bb3306d119CC777fa900bA034cd52",
    (Chain::Ethereum, "CVX", 18) => "4e3FBD56CD56c3e72c1403e103b45Db9da5B9D2B",

    // Arbitrum
    (Chain::Arbitrum, "USDC", 6) => "af88d065e77c8cC2239327C5EDb3A432268e5831",
    (Chain::Arbitrum, "USDT", 6) => "Fd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9",
    (Chain::Arbitrum, "WETH", 18) => "82aF49447D8a07e3bd95BD0d56f35241523fBab1",
    (Chain::Arbitrum, "WBTC", 8) => "2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f",
    (Chain::Arbitrum, "ARB", 18) => "912CE59144191C1204E64559FE8253a0e49E6548",

    // Optimism
    (Chain::Optimism, "USDC", 6) => "0b2C639c533813f4Aa9D7837CAf62653d097Ff85",
    (Chain::Optimism, "WETH", 18) => "4200000000000000000000000000000000000006",
    (Chain::Optimism, "OP", 18) => "4200000000000000000000000000000000000042",

    // Base
    (Chain::Base, "USDC", 6) => "833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
    (Chain::Base, "WETH", 18) => "4200000000000000000000000000000000000006",
    (Chain::Base, "AERO", 18) => "940181a94A35A4569E4529A3CDfB74e38FD98631",

    // Avalanche
    (Chain::Avalanche, "WAVAX", 18) => "B31f66AA3C1e785363F0875A1B74E27b85FD66c7",
    (Chain::Avalanche, "USDC", 6) => "B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E",
    (Chain::Avalanche, "PTP", 18) => "22d4002028f537599bE9f666d1c4Fa138522f9c1",
    (Chain::Avalanche, "VTX", 18) => "5817D4F0b62A59b17f75207DA1848C2cE75e7AF4",

    // Polygon
    (Chain::Polygon, "USDC", 6) => "3c499c542cEF5E3811e1192ce70d8cC03d5c3359",
    (Chain::Polygon, "WMATIC", 18) => "0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270",

    // BNB Chain
    (Chain::Bsc, "WBNB", 18) => "bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c",
    (Chain::Bsc, "CAKE", 18) => "0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82",

    // Fantom
    (Chain::Fantom, "WFTM", 18) => "21be370D5312f44cB42ce377BC9b8a0cEF1A4C83",
}

static BUILTIN_TOKENS: LazyLock<TokenRegistry> = LazyLock::new(build_builtin_tokens);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_by_address_and_symbol() {
        let registry = TokenRegistry::builtin();
        let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

        let token = registry.get(Chain::Ethereum, usdc).unwrap();
        assert_eq!(token.decimals, 6);
        assert_eq!(token.symbol, "USDC");

        assert_eq!(registry.by_symbol(Chain::Ethereum, "usdc").map(|t| t.address), Some(usdc));
        assert!(registry.get(Chain::Arbitrum, usdc).is_none());
    }

    #[test]
    fn test_same_address_on_different_chains() {
        let weth = address!("4200000000000000000000000000000000000006");
        let registry = TokenRegistry::builtin();

        assert!(registry.get(Chain::Base, weth).is_some());
        assert!(registry.get(Chain::Optimism, weth).is_some());
    }

    #[test]
    fn test_custom_registry() {
        let token = Entity::token(Chain::Avalanche, Address::repeat_byte(7), 18, "xPTP");
        let registry: TokenRegistry = std::iter::once(token.clone()).collect();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(Chain::Avalanche, Address::repeat_byte(7)), Some(&token));
        assert_eq!(registry.by_symbol(Chain::Avalanche, "XPTP"), Some(&token));
    }
}
