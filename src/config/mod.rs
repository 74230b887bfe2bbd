pub mod settings;
pub mod tokens;

pub use settings::*;
pub use tokens::TokenRegistry;
