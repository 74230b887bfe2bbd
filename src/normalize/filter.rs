use crate::models::Balance;

/// First candidate that resolved, in priority order.
///
/// Alternate sources for the same value (current and legacy getters) are
/// never merged: the first success wins even if a later one differs.
pub fn first_successful<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// Drop records with nothing in them, principal and rewards alike.
pub fn retain_non_zero(balances: Vec<Balance>) -> Vec<Balance> {
    balances.into_iter().filter(|b| !b.is_empty()).collect()
}
