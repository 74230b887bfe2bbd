use std::fmt;

use alloy::sol_types::SolCall;

use crate::error::CallError;
use crate::multicall::CallSpec;

/// Result of one call in a batch, aligned by index with the input.
///
/// Either way the original [`CallSpec`] is carried back, so callers can
/// correlate outputs without keeping a side table.
pub enum Outcome<C: SolCall> {
    Success { input: CallSpec<C>, output: C::Return },
    Failure { input: CallSpec<C>, reason: CallError },
}

impl<C: SolCall> Outcome<C> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn input(&self) -> &CallSpec<C> {
        match self {
            Outcome::Success { input, .. } | Outcome::Failure { input, .. } => input,
        }
    }

    pub fn output(&self) -> Option<&C::Return> {
        match self {
            Outcome::Success { output, .. } => Some(output),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn into_output(self) -> Option<C::Return> {
        match self {
            Outcome::Success { output, .. } => Some(output),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&CallError> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { reason, .. } => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<C::Return, CallError> {
        match self {
            Outcome::Success { output, .. } => Ok(output),
            Outcome::Failure { reason, .. } => Err(reason),
        }
    }
}

impl<C> Clone for Outcome<C>
where
    C: SolCall + Clone,
    C::Return: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Outcome::Success { input, output } => Outcome::Success {
                input: input.clone(),
                output: output.clone(),
            },
            Outcome::Failure { input, reason } => Outcome::Failure {
                input: input.clone(),
                reason: reason.clone(),
            },
        }
    }
}

impl<C> fmt::Debug for Outcome<C>
where
    C: SolCall + fmt::Debug,
    C::Return: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success { input, output } => f
                .debug_struct("Success")
                .field("input", input)
                .field("output", output)
                .finish(),
            Outcome::Failure { input, reason } => f
                .debug_struct("Failure")
                .field("input", input)
                .field("reason", reason)
                .finish(),
        }
    }
}

impl<C> PartialEq for Outcome<C>
where
    C: SolCall + PartialEq,
    C::Return: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Outcome::Success { input: a, output: x },
                Outcome::Success { input: b, output: y },
            ) => a == b && x == y,
            (
                Outcome::Failure { input: a, reason: x },
                Outcome::Failure { input: b, reason: y },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

/// Pair each entity with its outcome and keep only the successful ones.
///
/// Pairing happens before filtering, so a failure at index `i` can never
/// shift a later output onto entity `i`.
pub fn filter_successful<'a, E, C: SolCall>(
    entities: &'a [E],
    outcomes: Vec<Outcome<C>>,
) -> Vec<(&'a E, C::Return)> {
    entities
        .iter()
        .zip(outcomes)
        .filter_map(|(entity, outcome)| outcome.into_output().map(|output| (entity, output)))
        .collect()
}

/// Same as [`filter_successful`] for slots of a chained batch, where `None`
/// marks a call that was never issued.
pub fn filter_successful_optional<'a, E, C: SolCall>(
    entities: &'a [E],
    outcomes: Vec<Option<Outcome<C>>>,
) -> Vec<(&'a E, C::Return)> {
    entities
        .iter()
        .zip(outcomes)
        .filter_map(|(entity, outcome)| {
            outcome
                .and_then(Outcome::into_output)
                .map(|output| (entity, output))
        })
        .collect()
}

/// Map every successful outcome through `f` and drop the rest, including
/// the ones `f` rejects. `f` receives the slot index so callers can reach
/// the entity aligned with it.
pub fn map_success_filter<C, T, F>(outcomes: Vec<Outcome<C>>, mut f: F) -> Vec<T>
where
    C: SolCall,
    F: FnMut(usize, &CallSpec<C>, C::Return) -> Option<T>,
{
    outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(index, outcome)| match outcome {
            Outcome::Success { input, output } => f(index, &input, output),
            Outcome::Failure { .. } => None,
        })
        .collect()
}
