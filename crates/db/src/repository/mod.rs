//! Repository functions, one per database operation.
//!
//! Every function takes the `&mut SqliteConnection` of the caller's
//! [`Session`](crate::Session) and returns a `Result<T, DbError>`.
//! Pure SQL with no business logic or domain types.

pub mod playbooks;
pub mod workflows;
