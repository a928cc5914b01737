use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

use super::{ApiError, error_response};
use crate::auth::Claims;
use crate::domain::RatingAggregate;
use crate::services::{self, RateReview};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateRequest {
    /// 1 to 5 stars; may be omitted when editing an existing review
    pub rating: Option<i32>,
    /// Up to 300 characters
    pub body: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/reviews",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Reviews of every edition with like/dislike tallies"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_reviews(
    State(db): State<DatabaseConnection>,
    viewer: Option<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let reviews = services::list_book_reviews(&db, &id, viewer.as_ref().map(|c| c.user_id()))
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "reviews": reviews,
        "total": reviews.len()
    })))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}/editions/{edition_id}/review",
    params(
        ("id" = String, Path, description = "Book id"),
        ("edition_id" = String, Path, description = "Edition of the book being reviewed")
    ),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Review saved; returns the refreshed book aggregate"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Book or edition not found"),
        (status = 422, description = "Rating out of range, body too long or missing rating")
    )
)]
pub async fn rate_edition(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path((book_id, edition_id)): Path<(String, String)>,
    Json(payload): Json<RateRequest>,
) -> Result<Json<RatingAggregate>, ApiError> {
    let input = RateReview {
        user_id: claims.sub,
        book_id,
        edition_id,
        rating: payload.rating,
        body: payload.body,
    };

    services::rate(&db, input)
        .await
        .map(Json)
        .map_err(error_response)
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}/reviews/{review_id}",
    params(
        ("id" = String, Path, description = "Book id"),
        ("review_id" = String, Path, description = "Review id")
    ),
    responses(
        (status = 204, description = "Review deleted and aggregate refreshed"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "No such review owned by the caller on this book")
    )
)]
pub async fn delete_review(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path((book_id, review_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    services::delete_review(&db, claims.user_id(), &review_id, &book_id)
        .await
        .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
