//! Vote Store - one like/dislike row per (review, user)

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QuerySelect, Set,
};
use std::collections::{HashMap, HashSet};

use crate::domain::{DomainError, VoteType};
use crate::models::review_vote::{self, Entity as ReviewVote};

/// LIKE/DISLIKE counts for one review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// Bound parameters per `IN (...)` list, below SQLite's variable limit
pub const MAX_IDS_PER_QUERY: usize = 500;

#[derive(Debug, FromQueryResult)]
struct VoteTypeTotal {
    review_id: String,
    vote_type: String,
    total: i64,
}

pub async fn find_vote<C>(
    db: &C,
    review_id: &str,
    user_id: &str,
) -> Result<Option<review_vote::Model>, DomainError>
where
    C: ConnectionTrait,
{
    Ok(ReviewVote::find_by_id((review_id.to_string(), user_id.to_string()))
        .one(db)
        .await?)
}

/// Fails with `Conflict` when the user already voted on this review
pub async fn create_vote<C>(
    db: &C,
    review_id: &str,
    user_id: &str,
    vote_type: VoteType,
) -> Result<review_vote::Model, DomainError>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().to_rfc3339();
    let vote = review_vote::ActiveModel {
        review_id: Set(review_id.to_string()),
        user_id: Set(user_id.to_string()),
        vote_type: Set(vote_type.as_str().to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    Ok(vote.insert(db).await?)
}

pub async fn update_vote_type<C>(
    db: &C,
    review_id: &str,
    user_id: &str,
    vote_type: VoteType,
) -> Result<(), DomainError>
where
    C: ConnectionTrait,
{
    let result = ReviewVote::update_many()
        .col_expr(
            review_vote::Column::VoteType,
            Expr::value(vote_type.as_str()),
        )
        .col_expr(
            review_vote::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().to_rfc3339()),
        )
        .filter(review_vote::Column::ReviewId.eq(review_id))
        .filter(review_vote::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }

    Ok(())
}

pub async fn delete_vote<C>(db: &C, review_id: &str, user_id: &str) -> Result<(), DomainError>
where
    C: ConnectionTrait,
{
    let result = ReviewVote::delete_many()
        .filter(review_vote::Column::ReviewId.eq(review_id))
        .filter(review_vote::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }

    Ok(())
}

/// Grouped LIKE/DISLIKE counts for a set of reviews, one grouped query per
/// chunk of `MAX_IDS_PER_QUERY` distinct ids. Reviews without votes are absent
/// from the map.
pub async fn count_votes_by_type<C>(
    db: &C,
    review_ids: &[String],
) -> Result<HashMap<String, VoteCounts>, DomainError>
where
    C: ConnectionTrait,
{
    let mut counts: HashMap<String, VoteCounts> = HashMap::new();
    let ids = distinct_ids(review_ids);

    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let rows = ReviewVote::find()
            .select_only()
            .column(review_vote::Column::ReviewId)
            .column(review_vote::Column::VoteType)
            .column_as(Expr::col(review_vote::Column::UserId).count(), "total")
            .filter(review_vote::Column::ReviewId.is_in(chunk.iter().copied()))
            .group_by(review_vote::Column::ReviewId)
            .group_by(review_vote::Column::VoteType)
            .into_model::<VoteTypeTotal>()
            .all(db)
            .await?;

        for row in rows {
            let entry = counts.entry(row.review_id).or_default();
            match row.vote_type.parse::<VoteType>()? {
                VoteType::Like => entry.likes += row.total,
                VoteType::Dislike => entry.dislikes += row.total,
            }
        }
    }

    Ok(counts)
}

/// The votes one user cast on a set of reviews, chunked like `count_votes_by_type`
pub async fn find_user_votes<C>(
    db: &C,
    user_id: &str,
    review_ids: &[String],
) -> Result<HashMap<String, VoteType>, DomainError>
where
    C: ConnectionTrait,
{
    let mut found = HashMap::new();
    let ids = distinct_ids(review_ids);

    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let votes = ReviewVote::find()
            .filter(review_vote::Column::UserId.eq(user_id))
            .filter(review_vote::Column::ReviewId.is_in(chunk.iter().copied()))
            .all(db)
            .await?;

        for v in votes {
            let kind = v.kind()?;
            found.insert(v.review_id, kind);
        }
    }

    Ok(found)
}

// Repeated ids would otherwise land in two chunks and be counted twice
fn distinct_ids(review_ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    review_ids
        .iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}
