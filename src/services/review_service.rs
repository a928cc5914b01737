//! Review Service - lifecycle coordinator for reviews and votes
//!
//! Each write runs the store mutation and its dependent recompute inside one
//! scoped transaction. Store errors propagate unchanged; the only recovery is
//! the rollback performed by `in_transaction`.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainError, RatingAggregate, VoteOutcome, VoteType, normalize_body, validate_id,
    validate_rating,
};
use crate::infrastructure::transaction::in_transaction;
use crate::models::book::Entity as Book;
use crate::models::edition::{self, Entity as Edition};
use crate::models::review::{self, Entity as Review};
use crate::services::{rating_aggregator, review_store, vote_store, vote_tally};

/// Input of `rate`
#[derive(Debug, Clone, Deserialize)]
pub struct RateReview {
    pub user_id: String,
    pub book_id: String,
    pub edition_id: String,
    pub rating: Option<i32>,
    pub body: Option<String>,
}

/// A review decorated with its tally and the viewer's own vote
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithVotes {
    pub id: String,
    pub user_id: String,
    pub edition_id: String,
    pub rating: Option<i32>,
    pub body: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub likes: i64,
    pub dislikes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<VoteType>,
}

/// Create or edit the caller's review of an edition and refresh the book aggregate.
///
/// A rating is required for a new review. When editing, a missing rating keeps
/// the stored one while the body is always replaced.
pub async fn rate(db: &DatabaseConnection, input: RateReview) -> Result<RatingAggregate, DomainError> {
    let user_id = validate_id("user_id", &input.user_id)?;
    let book_id = validate_id("book_id", &input.book_id)?;
    let edition_id = validate_id("edition_id", &input.edition_id)?;
    let rating = validate_rating(input.rating)?;
    let body = normalize_body(input.body)?;

    let log_book_id = book_id.clone();
    let aggregate = in_transaction::<_, RatingAggregate>(db, move |txn| {
        Box::pin(async move {
            rating_aggregator::lock_book(txn, &book_id).await?;

            let edition = Edition::find_by_id(edition_id.as_str()).one(txn).await?;
            if !edition.is_some_and(|e| e.book_id == book_id) {
                return Err(DomainError::NotFound);
            }

            let existing = review_store::find_review(txn, &user_id, &edition_id).await?;
            let rating = match (existing, rating) {
                (_, Some(r)) => Some(r),
                (Some(previous), None) => previous.rating,
                (None, None) => {
                    return Err(DomainError::validation(
                        "a rating is required when creating a review",
                    ));
                }
            };

            review_store::upsert_review(txn, &user_id, &edition_id, rating, body).await?;
            rating_aggregator::recompute_book_rating(txn, &book_id).await
        })
    })
    .await?;

    tracing::info!(
        "Rated book {}: average={:?} count={}",
        log_book_id,
        aggregate.average_rating,
        aggregate.rating_count
    );

    Ok(aggregate)
}

/// Delete the caller's review and refresh the book aggregate
pub async fn delete_review(
    db: &DatabaseConnection,
    user_id: &str,
    review_id: &str,
    book_id: &str,
) -> Result<(), DomainError> {
    let user_id = validate_id("user_id", user_id)?;
    let review_id = validate_id("review_id", review_id)?;
    let book_id = validate_id("book_id", book_id)?;

    let log_review_id = review_id.clone();
    let aggregate = in_transaction::<_, RatingAggregate>(db, move |txn| {
        Box::pin(async move {
            rating_aggregator::lock_book(txn, &book_id).await?;

            // Only delete when the review really rolls up to this book
            if let Some(review) = review_store::find_by_id(txn, &review_id).await? {
                let edition = Edition::find_by_id(review.edition_id.as_str())
                    .one(txn)
                    .await?;
                if !edition.is_some_and(|e| e.book_id == book_id) {
                    return Err(DomainError::NotFound);
                }
            }

            review_store::delete_review(txn, &review_id, &user_id).await?;
            rating_aggregator::recompute_book_rating(txn, &book_id).await
        })
    })
    .await?;

    tracing::info!(
        "Deleted review {}: average={:?} count={}",
        log_review_id,
        aggregate.average_rating,
        aggregate.rating_count
    );

    Ok(())
}

/// Toggle the caller's vote on a review.
///
/// No vote: cast it. Same type: retract it. Other type: switch it.
/// Voting on one's own review is `Forbidden`.
pub async fn vote(
    db: &DatabaseConnection,
    user_id: &str,
    review_id: &str,
    vote_type: VoteType,
) -> Result<VoteOutcome, DomainError> {
    let user_id = validate_id("user_id", user_id)?;
    let review_id = validate_id("review_id", review_id)?;

    let log_review_id = review_id.clone();
    let outcome = in_transaction::<_, VoteOutcome>(db, move |txn| {
        Box::pin(async move {
            let review = review_store::find_by_id(txn, &review_id)
                .await?
                .ok_or(DomainError::NotFound)?;

            if review.user_id == user_id {
                return Err(DomainError::Forbidden(
                    "cannot vote on your own review".to_string(),
                ));
            }

            let current = vote_store::find_vote(txn, &review_id, &user_id)
                .await?
                .map(|v| v.kind())
                .transpose()?;

            let outcome = match current {
                None => {
                    vote_store::create_vote(txn, &review_id, &user_id, vote_type).await?;
                    VoteOutcome::cast(vote_type)
                }
                Some(existing) if existing == vote_type => {
                    vote_store::delete_vote(txn, &review_id, &user_id).await?;
                    VoteOutcome::retracted()
                }
                Some(_) => {
                    vote_store::update_vote_type(txn, &review_id, &user_id, vote_type).await?;
                    VoteOutcome::cast(vote_type)
                }
            };

            Ok(outcome)
        })
    })
    .await;

    match &outcome {
        Ok(o) => tracing::info!(
            "Vote on review {}: removed={} current={:?}",
            log_review_id,
            o.removed,
            o.current_type
        ),
        Err(DomainError::Conflict(msg)) => {
            tracing::warn!("Concurrent vote on review {} lost the race: {}", log_review_id, msg)
        }
        Err(_) => {}
    }

    outcome
}

/// Every review of every edition of a book, newest first, with tallies
pub async fn list_book_reviews(
    db: &DatabaseConnection,
    book_id: &str,
    viewer: Option<&str>,
) -> Result<Vec<ReviewWithVotes>, DomainError> {
    if Book::find_by_id(book_id).one(db).await?.is_none() {
        return Err(DomainError::NotFound);
    }

    let reviews = Review::find()
        .join(JoinType::InnerJoin, review::Relation::Edition.def())
        .filter(edition::Column::BookId.eq(book_id))
        .order_by_desc(review::Column::CreatedAt)
        .order_by_asc(review::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<String> = reviews.iter().map(|r| r.id.clone()).collect();
    let counts = vote_tally::get_vote_counts(db, &ids).await?;
    let mut mine = match viewer {
        Some(user_id) => vote_tally::get_user_votes(db, user_id, &ids).await?,
        None => Vec::new(),
    }
    .into_iter();

    Ok(reviews
        .into_iter()
        .zip(counts)
        .map(|(r, c)| ReviewWithVotes {
            id: r.id,
            user_id: r.user_id,
            edition_id: r.edition_id,
            rating: r.rating,
            body: r.body,
            created_at: r.created_at,
            updated_at: r.updated_at,
            likes: c.likes,
            dislikes: c.dislikes,
            my_vote: mine.next().and_then(|v| v.vote_type),
        })
        .collect())
}
