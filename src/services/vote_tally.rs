//! Vote Tally Service - batched, order-preserving vote reads

use sea_orm::ConnectionTrait;

use crate::domain::{DomainError, ReviewVoteCount, UserVote};
use crate::services::vote_store;

/// One entry per input id, in input order; reviews without votes get zeros
pub async fn get_vote_counts<C>(
    db: &C,
    review_ids: &[String],
) -> Result<Vec<ReviewVoteCount>, DomainError>
where
    C: ConnectionTrait,
{
    let counts = vote_store::count_votes_by_type(db, review_ids).await?;
    tracing::debug!(
        "Vote counts for {} reviews ({} with votes)",
        review_ids.len(),
        counts.len()
    );

    Ok(review_ids
        .iter()
        .map(|id| {
            let c = counts.get(id).copied().unwrap_or_default();
            ReviewVoteCount {
                review_id: id.clone(),
                likes: c.likes,
                dislikes: c.dislikes,
            }
        })
        .collect())
}

/// One entry per input id, in input order; `None` where the user has not voted
pub async fn get_user_votes<C>(
    db: &C,
    user_id: &str,
    review_ids: &[String],
) -> Result<Vec<UserVote>, DomainError>
where
    C: ConnectionTrait,
{
    let votes = vote_store::find_user_votes(db, user_id, review_ids).await?;

    Ok(review_ids
        .iter()
        .map(|id| UserVote {
            review_id: id.clone(),
            vote_type: votes.get(id).copied(),
        })
        .collect())
}
