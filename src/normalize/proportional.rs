use alloy::primitives::{U256, U512};

use crate::models::{Entity, TokenAmount};

/// `floor(reserve[i] * amount / total_supply)` for every reserve.
///
/// The product is taken in 512 bits, so no reserve/amount pair can overflow.
/// Returns `None` when `total_supply` is zero, or when a share would not fit
/// back into 256 bits (only possible with `amount > total_supply`).
pub fn split_proportional(amount: U256, total_supply: U256, reserves: &[U256]) -> Option<Vec<U256>> {
    if total_supply.is_zero() {
        return None;
    }

    let divisor = U512::from_limbs_slice(total_supply.as_limbs());
    reserves
        .iter()
        .map(|reserve| {
            let product: U512 = reserve.widening_mul(amount);
            narrow(product / divisor)
        })
        .collect()
}

fn narrow(value: U512) -> Option<U256> {
    if value.bit_len() > 256 {
        return None;
    }
    Some(U256::from_limbs_slice(&value.as_limbs()[..4]))
}

/// Pair each underlying with its share of `reserves` for a position of
/// `amount` pool tokens.
///
/// Extra reserve slots (fixed-size pool arrays) are ignored; an underlying
/// without a reserve slot makes the whole position unresolvable.
pub fn split_underlyings(
    underlyings: &[Entity],
    amount: U256,
    total_supply: U256,
    reserves: &[U256],
) -> Option<Vec<TokenAmount>> {
    if reserves.len() < underlyings.len() {
        return None;
    }
    let shares = split_proportional(amount, total_supply, &reserves[..underlyings.len()])?;
    Some(
        underlyings
            .iter()
            .zip(shares)
            .map(|(token, share)| TokenAmount::new(token, share))
            .collect(),
    )
}

/// Underlyings that track the principal one to one (staked tokens,
/// wrappers).
pub fn one_to_one_underlyings(underlyings: &[Entity], amount: U256) -> Vec<TokenAmount> {
    underlyings
        .iter()
        .map(|token| TokenAmount::new(token, amount))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chain;
    use alloy::primitives::Address;

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    #[test]
    fn test_split_proportional_floor() {
        assert_eq!(
            split_proportional(u(100), u(1000), &[u(500), u(2000)]),
            Some(vec![u(50), u(200)])
        );
        // 7 * 10 / 3 = 23.33..
        assert_eq!(split_proportional(u(10), u(3), &[u(7)]), Some(vec![u(23)]));
    }

    #[test]
    fn test_zero_total_supply_yields_none() {
        assert_eq!(split_proportional(u(100), U256::ZERO, &[u(500)]), None);
    }

    #[test]
    fn test_no_reserves_is_empty_split() {
        assert_eq!(split_proportional(u(1), u(1), &[]), Some(vec![]));
    }

    #[test]
    fn test_wide_intermediate_product() {
        // reserve * amount overflows 256 bits, the quotient does not
        let share = split_proportional(U256::MAX, U256::MAX, &[U256::MAX]).unwrap();
        assert_eq!(share, vec![U256::MAX]);

        let half = U256::MAX / u(2);
        let share = split_proportional(half, U256::MAX, &[U256::MAX]).unwrap();
        assert_eq!(share, vec![half]);
    }

    #[test]
    fn test_quotient_overflow_yields_none() {
        assert_eq!(split_proportional(U256::MAX, u(1), &[u(2)]), None);
    }

    #[test]
    fn test_split_underlyings() {
        let a = Entity::token(Chain::Ethereum, Address::repeat_byte(0xa), 18, "A");
        let b = Entity::token(Chain::Ethereum, Address::repeat_byte(0xb), 6, "B");
        let reserves = [u(500), u(2000), U256::ZERO, U256::ZERO];

        let split = split_underlyings(&[a.clone(), b.clone()], u(100), u(1000), &reserves).unwrap();

        assert_eq!(split, vec![TokenAmount::new(&a, u(50)), TokenAmount::new(&b, u(200))]);
        assert!(split_underlyings(&[a.clone(), b], u(100), u(1000), &reserves[..1]).is_none());
        assert!(split_underlyings(&[a], u(100), U256::ZERO, &reserves).is_none());
    }

    #[test]
    fn test_one_to_one() {
        let a = Entity::token(Chain::Ethereum, Address::repeat_byte(0xa), 18, "A");
        assert_eq!(one_to_one_underlyings(&[a.clone()], u(9)), vec![TokenAmount::new(&a, u(9))]);
    }
}
