//! Outbound adapters: PostgreSQL persistence and the remote catalog client.

pub mod catalog;
pub mod persistence;
