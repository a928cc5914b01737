//! Book Service - catalogue bootstrap for books and editions
//!
//! Ratings are never written here: new books start with an empty aggregate
//! and only the rating aggregator changes it afterwards.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::domain::{DomainError, validate_id};
use crate::models::book::{self, BookDto, Entity as Book};
use crate::models::edition::{self, EditionDto};

pub async fn create_book(db: &DatabaseConnection, dto: BookDto) -> Result<book::Model, DomainError> {
    let id = validate_id("book_id", &dto.id)?;
    let title = dto.title.trim().to_string();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_book = book::ActiveModel {
        id: Set(id),
        title: Set(title),
        average_rating: Set(None),
        rating_count: Set(0),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    let model = new_book.insert(db).await?;
    tracing::info!("Created book {}", model.id);
    Ok(model)
}

/// Attach an edition to an existing book
pub async fn create_edition(
    db: &DatabaseConnection,
    dto: EditionDto,
) -> Result<edition::Model, DomainError> {
    let id = validate_id("edition_id", &dto.id)?;
    let book_id = validate_id("book_id", &dto.book_id)?;

    if Book::find_by_id(book_id.as_str()).one(db).await?.is_none() {
        return Err(DomainError::NotFound);
    }

    let new_edition = edition::ActiveModel {
        id: Set(id),
        book_id: Set(book_id),
        label: Set(dto.label),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
    };

    let model = new_edition.insert(db).await?;
    tracing::info!("Created edition {} of book {}", model.id, model.book_id);
    Ok(model)
}
