use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::DatabaseConnection;

use super::{ApiError, error_response};
use crate::domain::RatingAggregate;
use crate::services::rating_aggregator;

#[utoipa::path(
    get,
    path = "/api/books/{id}/rating",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Average rating and rating count of the book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_rating(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> Result<Json<RatingAggregate>, ApiError> {
    rating_aggregator::get_book_rating(&db, &id)
        .await
        .map(Json)
        .map_err(error_response)
}
