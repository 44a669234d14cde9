//! Application services: the post gateway, the feed engine and agile queries.

pub mod actor;
pub mod agile;
pub mod confirm;
pub mod error;
pub mod feed;
pub mod join;
pub mod posts;
pub mod repos;

#[cfg(test)]
pub(crate) mod testing;
