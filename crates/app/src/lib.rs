//! Tenant-scoped persistence and checkout services for the pricebook engine.

pub mod config;
pub mod database;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;
