//! Token value types shared by the store, refresh coordinator, and executor.

pub mod pair;
pub mod secret;
