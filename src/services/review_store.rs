//! Review Store - durable CRUD for review rows
//!
//! Every function takes the connection explicitly so callers can pass the
//! transaction of the operation they belong to. None of them touch the book
//! aggregate; that is the coordinator's job.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::domain::{DomainError, normalize_body, validate_rating};
use crate::models::review::{self, Entity as Review};

/// Insert the (user, edition) review, or overwrite rating and body in place
pub async fn upsert_review<C>(
    db: &C,
    user_id: &str,
    edition_id: &str,
    rating: Option<i32>,
    body: Option<String>,
) -> Result<review::Model, DomainError>
where
    C: ConnectionTrait,
{
    let rating = validate_rating(rating)?;
    let body = normalize_body(body)?;
    let now = chrono::Utc::now().to_rfc3339();

    let row = review::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        edition_id: Set(edition_id.to_string()),
        rating: Set(rating),
        body: Set(body),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    // Single statement, so two first-time writes for the same pair cannot both insert
    Review::insert(row)
        .on_conflict(
            OnConflict::columns([review::Column::UserId, review::Column::EditionId])
                .update_columns([
                    review::Column::Rating,
                    review::Column::Body,
                    review::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find_review(db, user_id, edition_id)
        .await?
        .ok_or(DomainError::NotFound)
}

/// The review a user wrote for an edition, if any
pub async fn find_review<C>(
    db: &C,
    user_id: &str,
    edition_id: &str,
) -> Result<Option<review::Model>, DomainError>
where
    C: ConnectionTrait,
{
    Ok(Review::find()
        .filter(review::Column::UserId.eq(user_id))
        .filter(review::Column::EditionId.eq(edition_id))
        .one(db)
        .await?)
}

pub async fn find_by_id<C>(db: &C, review_id: &str) -> Result<Option<review::Model>, DomainError>
where
    C: ConnectionTrait,
{
    Ok(Review::find_by_id(review_id).one(db).await?)
}

/// Delete a review owned by `user_id`.
/// Missing and foreign-owned reviews yield the same `NotFound`.
pub async fn delete_review<C>(db: &C, review_id: &str, user_id: &str) -> Result<(), DomainError>
where
    C: ConnectionTrait,
{
    let result = Review::delete_many()
        .filter(review::Column::Id.eq(review_id))
        .filter(review::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }

    Ok(())
}
