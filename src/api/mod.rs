pub mod books;
pub mod health;
pub mod ratings;
pub mod reviews;
pub mod votes;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub type ApiError = (StatusCode, Json<Value>);

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Catalogue
        .route("/books", post(books::create_book))
        .route("/books/:id/editions", post(books::create_edition))
        // Book aggregates and reviews
        .route("/books/:id/rating", get(ratings::get_book_rating))
        .route("/books/:id/reviews", get(reviews::list_book_reviews))
        .route(
            "/books/:id/editions/:edition_id/review",
            put(reviews::rate_edition),
        )
        .route(
            "/books/:id/reviews/:review_id",
            delete(reviews::delete_review),
        )
        // Votes
        .route("/reviews/:id/vote", post(votes::vote))
        .route("/votes/counts", post(votes::vote_counts))
        .route("/votes/mine", post(votes::my_votes))
        .with_state(state)
}

/// Map a domain error onto the HTTP status and JSON body the clients expect
pub fn error_response(e: DomainError) -> ApiError {
    let status = match &e {
        DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Database(msg) => {
            tracing::error!("Database error: {}", msg);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            );
        }
    };

    (status, Json(json!({ "error": e.to_string() })))
}
