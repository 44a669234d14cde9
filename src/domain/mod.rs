//! Domain layer types and invariants.

pub mod agile;
pub mod entities;
pub mod error;
pub mod posts;
pub mod reactions;
pub mod types;
