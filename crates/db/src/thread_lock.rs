//! Per-thread write serialization.
//!
//! Every write that reads the candidate conversation of a `(page, customer)`
//! pair and then decides what to insert runs inside a [`ThreadLock`]: a
//! transaction holding a `PostgreSQL` transaction-scoped advisory lock on
//! the pair. Concurrent writers of the same pair queue on the lock, writers
//! of other pairs proceed in parallel, and the lock is released on commit or
//! rollback.

use pagedesk_core::threading::ThreadKey;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, Statement,
    TransactionTrait,
};

/// A transaction holding the advisory lock of one thread key.
pub struct ThreadLock {
    txn: DatabaseTransaction,
}

impl ThreadLock {
    /// Begins a transaction and blocks until the thread's advisory lock is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the lock
    /// cannot be taken.
    pub async fn acquire(db: &DatabaseConnection, key: &ThreadKey) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        lock_in(&txn, key).await?;
        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction and releases the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction and releases the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

async fn lock_in(txn: &DatabaseTransaction, key: &ThreadKey) -> Result<(), DbErr> {
    txn.execute(lock_statement(key)).await?;
    Ok(())
}

fn lock_statement(key: &ThreadKey) -> Statement {
    Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [key.lock_key().into()],
    )
}
