//! Per-request transaction scope.
//!
//! A [`Session`] is acquired once at the start of a request and handed by
//! `&mut` to every repository call the request makes.  It must be closed with
//! [`Session::commit`] or [`Session::rollback`]; dropping it unclosed rolls
//! the transaction back.

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::debug;

use crate::{DbError, DbPool};

pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl Session {
    /// Open a read transaction on a pooled connection.
    ///
    /// The transaction takes no lock until its first statement.  Use
    /// [`Session::begin_write`] for anything that may write.
    pub async fn begin(pool: &DbPool) -> Result<Self, DbError> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }

    /// Open a transaction holding the database write lock from the start.
    ///
    /// Concurrent writers queue on `BEGIN IMMEDIATE` (up to the pool's busy
    /// timeout) instead of failing when a read-then-write upgrades its lock.
    pub async fn begin_write(pool: &DbPool) -> Result<Self, DbError> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Self { tx })
    }

    /// The connection the repository functions run against.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    /// Commit everything written through this session.
    ///
    /// Constraint failures deferred to commit time surface here as
    /// [`DbError::Conflict`].
    pub async fn commit(self) -> Result<(), DbError> {
        self.tx.commit().await?;
        debug!("session committed");
        Ok(())
    }

    /// Discard everything written through this session.
    pub async fn rollback(self) -> Result<(), DbError> {
        self.tx.rollback().await?;
        debug!("session rolled back");
        Ok(())
    }
}
