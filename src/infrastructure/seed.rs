use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::models::{book, edition};

pub const DEMO_BOOK_ID: &str = "demo-book";

/// Demo catalogue: one book with two editions, no reviews
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    let demo_book = book::ActiveModel {
        id: Set(DEMO_BOOK_ID.to_owned()),
        title: Set("The Left Hand of Darkness".to_owned()),
        average_rating: Set(None),
        rating_count: Set(0),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };

    book::Entity::insert(demo_book)
        .on_conflict(OnConflict::column(book::Column::Id).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    let editions = [
        ("demo-edition-hardcover", "Hardcover, 1969"),
        ("demo-edition-paperback", "Paperback, 50th anniversary"),
    ]
    .into_iter()
    .map(|(id, label)| edition::ActiveModel {
        id: Set(id.to_owned()),
        book_id: Set(DEMO_BOOK_ID.to_owned()),
        label: Set(Some(label.to_owned())),
        created_at: Set(now.clone()),
    });

    edition::Entity::insert_many(editions)
        .on_conflict(OnConflict::column(edition::Column::Id).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    Ok(())
}
