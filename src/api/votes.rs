use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;
use utoipa::ToSchema;

use super::{ApiError, error_response};
use crate::auth::Claims;
use crate::domain::{DomainError, VoteType};
use crate::services;

/// Run `op`, and once more if it loses a unique-constraint race.
/// The second attempt starts a fresh transaction and re-reads the current vote.
async fn retry_once_on_conflict<F, Fut, T>(mut op: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    match op().await {
        Err(DomainError::Conflict(msg)) => {
            tracing::debug!("Retrying after conflict: {}", msg);
            op().await
        }
        other => other,
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// "LIKE" or "DISLIKE"
    #[serde(rename = "type")]
    pub vote_type: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewIdsRequest {
    pub review_ids: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/vote",
    params(("id" = String, Path, description = "Review id")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote cast, switched or retracted; includes the refreshed tally"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Voting on one's own review"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Concurrent vote from the same user, retry failed")
    )
)]
pub async fn vote(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<String>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let vote_type: VoteType = payload.vote_type.parse().map_err(error_response)?;

    let (conn, user_id, review_id) = (&db, claims.user_id(), id.as_str());
    let outcome =
        retry_once_on_conflict(move || services::vote(conn, user_id, review_id, vote_type))
            .await
            .map_err(error_response)?;

    let tally = services::get_vote_counts(&db, std::slice::from_ref(&id))
        .await
        .map_err(error_response)?;

    let mut body = serde_json::to_value(&outcome).unwrap_or_else(|_| json!({}));
    if let (Some(obj), Some(count)) = (body.as_object_mut(), tally.first()) {
        obj.insert("likes".to_string(), json!(count.likes));
        obj.insert("dislikes".to_string(), json!(count.dislikes));
    }

    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/api/votes/counts",
    request_body = ReviewIdsRequest,
    responses(
        (status = 200, description = "One like/dislike tally per requested review, in request order")
    )
)]
pub async fn vote_counts(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<ReviewIdsRequest>,
) -> Result<Json<Value>, ApiError> {
    let counts = services::get_vote_counts(&db, &payload.review_ids)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "counts": counts })))
}

#[utoipa::path(
    post,
    path = "/api/votes/mine",
    request_body = ReviewIdsRequest,
    responses(
        (status = 200, description = "The caller's vote per requested review, in request order"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn my_votes(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<ReviewIdsRequest>,
) -> Result<Json<Value>, ApiError> {
    let votes = services::get_user_votes(&db, claims.user_id(), &payload.review_ids)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "votes": votes })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::{book, edition};
    use crate::services::{RateReview, review_store, vote_store};
    use sea_orm::{ActiveModelTrait, Set};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn setup_review(db: &DatabaseConnection) -> String {
        let now = chrono::Utc::now().to_rfc3339();
        book::ActiveModel {
            id: Set("b1".to_string()),
            title: Set("Book b1".to_string()),
            average_rating: Set(None),
            rating_count: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        }
        .insert(db)
        .await
        .unwrap();
        edition::ActiveModel {
            id: Set("e1".to_string()),
            book_id: Set("b1".to_string()),
            label: Set(None),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap();

        services::rate(
            db,
            RateReview {
                user_id: "author".to_string(),
                book_id: "b1".to_string(),
                edition_id: "e1".to_string(),
                rating: Some(4),
                body: None,
            },
        )
        .await
        .unwrap();
        review_store::find_review(db, "author", "e1")
            .await
            .unwrap()
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_conflict_is_retried_on_fresh_state() {
        let db = init_db("sqlite::memory:").await.unwrap();
        let review_id = setup_review(&db).await;
        let attempts = AtomicUsize::new(0);
        let (db, review_id, attempts) = (&db, review_id.as_str(), &attempts);

        let outcome = retry_once_on_conflict(move || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                // A parallel request lands its LIKE first, then ours hits the primary key
                vote_store::create_vote(db, review_id, "reader", VoteType::Like).await?;
                vote_store::create_vote(db, review_id, "reader", VoteType::Like).await?;
            }
            services::vote(db, "reader", review_id, VoteType::Like).await
        })
        .await
        .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        // The retry saw the winner's LIKE and toggled it off
        assert_eq!(outcome, crate::domain::VoteOutcome::retracted());
        let counts = services::get_vote_counts(db, &[review_id.to_string()])
            .await
            .unwrap();
        assert_eq!((counts[0].likes, counts[0].dislikes), (0, 0));
    }

    #[tokio::test]
    async fn test_second_conflict_is_returned() {
        let attempts = AtomicUsize::new(0);
        let attempts = &attempts;

        let result: Result<(), DomainError> = retry_once_on_conflict(move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::Conflict("lost again".to_string()))
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let attempts = &attempts;

        let result: Result<(), DomainError> = retry_once_on_conflict(move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::NotFound)
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(result, Err(DomainError::NotFound));
    }
}
