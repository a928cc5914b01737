//! Scoped transactions
//!
//! `in_transaction` opens a transaction, hands it to the unit of work, and
//! commits when the work returns `Ok`. Any `Err` (or a panic/drop) rolls the
//! transaction back, so no partial mutation is ever visible to other readers.

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

use crate::domain::DomainError;

pub type UnitOfWork<'c, T> = Pin<Box<dyn Future<Output = Result<T, DomainError>> + Send + 'c>>;

pub async fn in_transaction<F, T>(db: &DatabaseConnection, work: F) -> Result<T, DomainError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> UnitOfWork<'c, T> + Send,
    T: Send,
{
    db.transaction::<_, T, DomainError>(work)
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => {
                tracing::error!("Transaction failed to begin or commit: {}", db_err);
                DomainError::from(db_err)
            }
            TransactionError::Transaction(err) => err,
        })
}
