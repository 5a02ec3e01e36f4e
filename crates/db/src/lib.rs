//! `db` crate: pure persistence layer.
//!
//! Provides a SQLite connection pool, the per-request [`Session`], typed row
//! structs, and repository functions for the `playbooks` and `workflows`
//! tables.  No business logic lives here.

pub mod error;
pub mod pool;
pub mod repository;
pub mod models;
pub mod session;

pub use pool::DbPool;
pub use error::DbError;
pub use session::Session;
