pub mod balance;
pub mod chain;
pub mod context;
pub mod entity;

pub use balance::*;
pub use chain::*;
pub use context::*;
pub use entity::*;
