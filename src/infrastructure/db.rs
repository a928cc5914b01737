use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON".to_owned(),
    ))
    .await?;

    // Books carry the denormalized rating aggregate
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            average_rating REAL,
            rating_count INTEGER NOT NULL DEFAULT 0 CHECK (rating_count >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS editions (
            id TEXT PRIMARY KEY,
            book_id TEXT NOT NULL,
            label TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_editions_book_id ON editions(book_id);
        "#
        .to_owned(),
    ))
    .await?;

    // One review per (user, edition)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            edition_id TEXT NOT NULL,
            rating INTEGER CHECK (rating IS NULL OR (rating BETWEEN 1 AND 5)),
            body TEXT CHECK (body IS NULL OR length(body) <= 300),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (edition_id) REFERENCES editions(id) ON DELETE CASCADE
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_user_edition ON reviews(user_id, edition_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_edition_id ON reviews(edition_id);
        "#
        .to_owned(),
    ))
    .await?;

    // One vote per (review, user); the composite key is the race backstop
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS review_votes (
            review_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            vote_type TEXT NOT NULL CHECK (vote_type IN ('LIKE', 'DISLIKE')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (review_id, user_id),
            FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_review_votes_user_id ON review_votes(user_id);
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}
