//! Token models, access-token providers, and the persisted token store.

pub mod provider;
pub mod token;
pub mod tokens;

pub use provider::*;
pub use token::{pair::*, secret::*};
pub use tokens::*;
