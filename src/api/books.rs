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
use crate::models::book::BookDto;
use crate::models::edition::EditionDto;
use crate::services::book_service;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEditionRequest {
    pub id: String,
    pub label: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created with an empty rating aggregate"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "A book with this id already exists"),
        (status = 422, description = "Malformed id or empty title")
    )
)]
pub async fn create_book(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let dto = BookDto {
        id: payload.id,
        title: payload.title,
    };

    let model = book_service::create_book(&db, dto)
        .await
        .map_err(error_response)?;
    tracing::debug!("Book {} created by {}", model.id, claims.user_id());

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Book created successfully",
            "book": model
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/books/{id}/editions",
    params(("id" = String, Path, description = "Book id")),
    request_body = CreateEditionRequest,
    responses(
        (status = 201, description = "Edition attached to the book"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "An edition with this id already exists")
    )
)]
pub async fn create_edition(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id): Path<String>,
    Json(payload): Json<CreateEditionRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let dto = EditionDto {
        id: payload.id,
        book_id: id,
        label: payload.label,
    };

    let model = book_service::create_edition(&db, dto)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Edition created successfully",
            "edition": model
        })),
    ))
}
