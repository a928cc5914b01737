//! Rating Aggregator - maintains `books.average_rating` / `books.rating_count`
//!
//! The aggregate is recomputed from the review rows of every edition of the
//! book. Callers run it inside the transaction that mutated the reviews, after
//! `lock_book`, so concurrent writers on the same book serialize and the
//! recompute always reads post-mutation state.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QuerySelect, RelationTrait,
};

use crate::domain::{DomainError, RatingAggregate};
use crate::infrastructure::transaction::in_transaction;
use crate::models::book::{self, Entity as Book};
use crate::models::edition;
use crate::models::review::{self, Entity as Review};

#[derive(Debug, FromQueryResult)]
struct RatingTotals {
    rated: i64,
    total: Option<i64>,
}

/// Take the write lock on the book row for the rest of the transaction.
///
/// Touching the row is a write, so it holds the row lock on servers with row
/// locking and the database write lock on SQLite; a second writer on the same
/// book waits here until the first one commits.
pub async fn lock_book<C>(db: &C, book_id: &str) -> Result<(), DomainError>
where
    C: ConnectionTrait,
{
    let result = Book::update_many()
        .col_expr(
            book::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().to_rfc3339()),
        )
        .filter(book::Column::Id.eq(book_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }

    Ok(())
}

/// Recompute and persist the aggregate of one book
pub async fn recompute_book_rating<C>(db: &C, book_id: &str) -> Result<RatingAggregate, DomainError>
where
    C: ConnectionTrait,
{
    let totals = Review::find()
        .select_only()
        .column_as(Expr::col((review::Entity, review::Column::Rating)).count(), "rated")
        .column_as(Expr::col((review::Entity, review::Column::Rating)).sum(), "total")
        .join(JoinType::InnerJoin, review::Relation::Edition.def())
        .filter(edition::Column::BookId.eq(book_id))
        .filter(review::Column::Rating.is_not_null())
        .into_model::<RatingTotals>()
        .one(db)
        .await?;

    let aggregate = match totals {
        Some(t) => RatingAggregate::from_totals(t.total.unwrap_or(0), t.rated),
        None => RatingAggregate::empty(),
    };

    let result = Book::update_many()
        .col_expr(
            book::Column::AverageRating,
            Expr::value(aggregate.average_as_f64()),
        )
        .col_expr(
            book::Column::RatingCount,
            Expr::value(stored_count(aggregate.rating_count)?),
        )
        .col_expr(
            book::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().to_rfc3339()),
        )
        .filter(book::Column::Id.eq(book_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }

    tracing::debug!(
        "Book {} aggregate: average={:?} count={}",
        book_id,
        aggregate.average_rating,
        aggregate.rating_count
    );

    Ok(aggregate)
}

// `books.rating_count` is an INTEGER column mapped to i32
fn stored_count(rating_count: i64) -> Result<i32, DomainError> {
    i32::try_from(rating_count).map_err(|_| {
        DomainError::Database(format!(
            "rating count {} does not fit the books.rating_count column",
            rating_count
        ))
    })
}

/// The stored aggregate of a book
pub async fn get_book_rating<C>(db: &C, book_id: &str) -> Result<RatingAggregate, DomainError>
where
    C: ConnectionTrait,
{
    Book::find_by_id(book_id)
        .one(db)
        .await?
        .map(|b| b.rating())
        .ok_or(DomainError::NotFound)
}

/// Recompute every book, one transaction per book. Returns the number of books processed.
pub async fn rebuild_all_ratings(db: &DatabaseConnection) -> Result<usize, DomainError> {
    let book_ids: Vec<String> = Book::find()
        .select_only()
        .column(book::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut drifted = 0;
    for book_id in &book_ids {
        let id = book_id.clone();
        let (before, after) =
            in_transaction::<_, (RatingAggregate, RatingAggregate)>(db, move |txn| {
                Box::pin(async move {
                    lock_book(txn, &id).await?;
                    let before = get_book_rating(txn, &id).await?;
                    let after = recompute_book_rating(txn, &id).await?;
                    Ok((before, after))
                })
            })
            .await?;

        if before != after {
            drifted += 1;
            tracing::warn!(
                "Repaired rating drift on book {}: {:?} -> {:?}",
                book_id,
                before,
                after
            );
        }
    }

    tracing::info!(
        "Rebuilt ratings for {} books ({} repaired)",
        book_ids.len(),
        drifted
    );

    Ok(book_ids.len())
}
