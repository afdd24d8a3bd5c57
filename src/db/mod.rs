//! PostgreSQL connectivity shared by the query executor and the audit log.

pub mod connection;

pub use connection::{classify_sqlx_error, init_pool, DbPool};
