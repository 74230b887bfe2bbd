//! Batched on-chain reads and balance normalization for DeFi position
//! adapters.
//!
//! Adapters describe contract reads as typed [`multicall::CallSpec`]s, the
//! [`multicall::BatchDispatcher`] executes them in as few round trips as the
//! transport allows and hands back index-aligned [`multicall::Outcome`]s, and
//! the [`normalize`] helpers turn successful outcomes into [`models::Balance`]
//! records.

pub mod adapters;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod multicall;
pub mod normalize;
pub mod utils;

pub use adapters::{resolve_balances, BalanceResolver};
pub use config::Settings;
pub use error::{CallError, EngineError};
pub use models::{Balance, BalancesContext, Category, Chain, Entity, TokenAmount};
pub use multicall::{BatchDispatcher, CallSpec, CallTransport, Outcome};
