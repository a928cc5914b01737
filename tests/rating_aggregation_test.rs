//! Rating aggregation tests
//! Book aggregates must always match the rated reviews of all editions

use bibliorate::db;
use bibliorate::domain::{DomainError, RatingAggregate};
use bibliorate::models::{book, edition, review};
use bibliorate::services::{self, RateReview, rating_aggregator, review_store};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// Helper to create a test book
async fn create_test_book(db: &DatabaseConnection, id: &str) {
    let now = chrono::Utc::now().to_rfc3339();
    let book_model = book::ActiveModel {
        id: Set(id.to_string()),
        title: Set(format!("Book {}", id)),
        average_rating: Set(None),
        rating_count: Set(0),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };
    book_model.insert(db).await.expect("Failed to create book");
}

// Helper to create a test edition
async fn create_test_edition(db: &DatabaseConnection, id: &str, book_id: &str) {
    let edition_model = edition::ActiveModel {
        id: Set(id.to_string()),
        book_id: Set(book_id.to_string()),
        label: Set(None),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
    };
    edition_model
        .insert(db)
        .await
        .expect("Failed to create edition");
}

async fn fetch_book(db: &DatabaseConnection, id: &str) -> book::Model {
    book::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("DB error")
        .expect("Book missing")
}

fn rate_input(user: &str, book: &str, edition: &str, rating: Option<i32>) -> RateReview {
    RateReview {
        user_id: user.to_string(),
        book_id: book.to_string(),
        edition_id: edition.to_string(),
        rating,
        body: None,
    }
}

fn avg(tenths: i64) -> Option<Decimal> {
    Some(Decimal::new(tenths, 1))
}

#[tokio::test]
async fn test_rate_and_delete_scenario() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;
    create_test_edition(&db, "e2", "b1").await;

    // 0 reviews
    let empty = services::get_book_rating(&db, "b1").await.unwrap();
    assert_eq!(empty, RatingAggregate::empty());

    // User A rates E1 with 5
    let agg = services::rate(&db, rate_input("alice", "b1", "e1", Some(5)))
        .await
        .expect("rate failed");
    assert_eq!(agg.average_rating, avg(50));
    assert_eq!(agg.rating_count, 1);

    // User B rates E2 of the same book with 2
    let agg = services::rate(&db, rate_input("bob", "b1", "e2", Some(2)))
        .await
        .expect("rate failed");
    assert_eq!(agg.average_rating, avg(35));
    assert_eq!(agg.rating_count, 2);

    // User A deletes their review
    let alice_review = review_store::find_review(&db, "alice", "e1")
        .await
        .unwrap()
        .expect("review missing");
    services::delete_review(&db, "alice", &alice_review.id, "b1")
        .await
        .expect("delete failed");

    let stored = fetch_book(&db, "b1").await;
    assert_eq!(stored.rating_count, 1);
    assert_eq!(stored.average_rating, Some(2.0));
    assert_eq!(stored.rating().average_rating, avg(20));

    // Last review gone: back to NULL / 0
    let bob_review = review_store::find_review(&db, "bob", "e2")
        .await
        .unwrap()
        .expect("review missing");
    services::delete_review(&db, "bob", &bob_review.id, "b1")
        .await
        .expect("delete failed");
    let stored = fetch_book(&db, "b1").await;
    assert_eq!(stored.average_rating, None);
    assert_eq!(stored.rating_count, 0);
}

#[tokio::test]
async fn test_rate_twice_is_idempotent() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;

    let mut input = rate_input("alice", "b1", "e1", Some(4));
    input.body = Some("Loved the ending".to_string());

    let first = services::rate(&db, input.clone()).await.unwrap();
    let second = services::rate(&db, input).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.rating_count, 1);

    let review = review_store::find_review(&db, "alice", "e1")
        .await
        .unwrap()
        .unwrap();
    let all = review::Entity::find().all(&db).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, review.id);
}

#[tokio::test]
async fn test_out_of_range_rating_leaves_book_untouched() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;
    services::rate(&db, rate_input("alice", "b1", "e1", Some(3)))
        .await
        .unwrap();
    let before = fetch_book(&db, "b1").await;

    for bad in [0, 6, -1] {
        let err = services::rate(&db, rate_input("bob", "b1", "e1", Some(bad)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "{:?}", err);
    }

    let after = fetch_book(&db, "b1").await;
    assert_eq!(before, after);
    assert!(
        review_store::find_review(&db, "bob", "e1")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;

    let mut input = rate_input("alice", "b1", "e1", Some(4));
    input.body = Some("x".repeat(301));
    let err = services::rate(&db, input).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(fetch_book(&db, "b1").await.rating_count, 0);
}

#[tokio::test]
async fn test_rating_required_on_create_preserved_on_edit() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;

    // No rating on first write
    let err = services::rate(&db, rate_input("alice", "b1", "e1", None))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert!(
        review_store::find_review(&db, "alice", "e1")
            .await
            .unwrap()
            .is_none()
    );

    services::rate(&db, rate_input("alice", "b1", "e1", Some(4)))
        .await
        .unwrap();

    // Edit the text only: rating stays, body is replaced
    let mut edit = rate_input("alice", "b1", "e1", None);
    edit.body = Some("Second read was even better".to_string());
    let agg = services::rate(&db, edit).await.unwrap();
    assert_eq!(agg.average_rating, avg(40));
    assert_eq!(agg.rating_count, 1);

    let review = review_store::find_review(&db, "alice", "e1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(review.rating, Some(4));
    assert_eq!(review.body.as_deref(), Some("Second read was even better"));

    // Change the rating: RATED -> RATED
    let agg = services::rate(&db, rate_input("alice", "b1", "e1", Some(2)))
        .await
        .unwrap();
    assert_eq!(agg.average_rating, avg(20));
    assert_eq!(agg.rating_count, 1);
    let review = review_store::find_review(&db, "alice", "e1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(review.body, None);
}

#[tokio::test]
async fn test_text_only_reviews_are_not_counted() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;

    services::rate(&db, rate_input("alice", "b1", "e1", Some(5)))
        .await
        .unwrap();

    // A text-only review written directly through the store
    review_store::upsert_review(&db, "carol", "e1", None, Some("No stars".into()))
        .await
        .unwrap();

    let agg = rating_aggregator::recompute_book_rating(&db, "b1")
        .await
        .unwrap();
    assert_eq!(agg.average_rating, avg(50));
    assert_eq!(agg.rating_count, 1);
}

#[tokio::test]
async fn test_average_rounds_half_up() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;

    let mut last = None;
    for (user, rating) in [("u1", 3), ("u2", 3), ("u3", 3), ("u4", 4)] {
        last = Some(
            services::rate(&db, rate_input(user, "b1", "e1", Some(rating)))
                .await
                .unwrap(),
        );
    }

    // 13 / 4 = 3.25
    let agg = last.unwrap();
    assert_eq!(agg.average_rating, avg(33));
    assert_eq!(agg.rating_count, 4);
    assert_eq!(fetch_book(&db, "b1").await.average_rating, Some(3.3));
}

#[tokio::test]
async fn test_aggregates_are_per_book() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_book(&db, "b2").await;
    create_test_edition(&db, "e1", "b1").await;
    create_test_edition(&db, "e2", "b2").await;

    services::rate(&db, rate_input("alice", "b1", "e1", Some(5)))
        .await
        .unwrap();
    services::rate(&db, rate_input("alice", "b2", "e2", Some(1)))
        .await
        .unwrap();

    assert_eq!(fetch_book(&db, "b1").await.average_rating, Some(5.0));
    assert_eq!(fetch_book(&db, "b2").await.average_rating, Some(1.0));
}

#[tokio::test]
async fn test_edition_of_another_book_rolls_back() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_book(&db, "b2").await;
    create_test_edition(&db, "e2", "b2").await;
    let before = fetch_book(&db, "b1").await;

    let err = services::rate(&db, rate_input("alice", "b1", "e2", Some(5)))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    // The book lock touched updated_at before failing; it must be rolled back
    assert_eq!(fetch_book(&db, "b1").await, before);
    assert!(review::Entity::find().all(&db).await.unwrap().is_empty());

    let err = services::rate(&db, rate_input("alice", "missing", "e2", Some(5)))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);
}

#[tokio::test]
async fn test_malformed_ids_are_rejected() {
    let db = setup_test_db().await;

    let err = services::rate(&db, rate_input("  ", "b1", "e1", Some(3)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let long = "x".repeat(100);
    let err = services::rate(&db, rate_input("alice", &long, "e1", Some(3)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_delete_requires_ownership_and_matching_book() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_book(&db, "b2").await;
    create_test_edition(&db, "e1", "b1").await;

    services::rate(&db, rate_input("alice", "b1", "e1", Some(4)))
        .await
        .unwrap();
    let review = review_store::find_review(&db, "alice", "e1")
        .await
        .unwrap()
        .unwrap();

    // Someone else's review looks exactly like a missing one
    let err = services::delete_review(&db, "mallory", &review.id, "b1")
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);
    let err = services::delete_review(&db, "alice", "no-such-review", "b1")
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    // Right owner, wrong book
    let err = services::delete_review(&db, "alice", &review.id, "b2")
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    let stored = fetch_book(&db, "b1").await;
    assert_eq!(stored.rating_count, 1);
    assert_eq!(stored.average_rating, Some(4.0));
}

#[tokio::test]
async fn test_concurrent_rates_on_same_book_are_all_counted() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_edition(&db, "e1", "b1").await;
    create_test_edition(&db, "e2", "b1").await;

    let calls = (0..12).map(|i| {
        let db = db.clone();
        let edition = if i % 2 == 0 { "e1" } else { "e2" };
        let input = rate_input(&format!("user-{}", i), "b1", edition, Some(i % 5 + 1));
        async move { services::rate(&db, input).await }
    });

    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);

    // Ratings 1..=5 cycling over 12 users: 1+2+3+4+5+1+2+3+4+5+1+2 = 33
    let stored = fetch_book(&db, "b1").await;
    assert_eq!(stored.rating_count, 12);
    assert_eq!(stored.rating().average_rating, avg(28));
}

#[tokio::test]
async fn test_rebuild_all_ratings_repairs_drift() {
    let db = setup_test_db().await;
    create_test_book(&db, "b1").await;
    create_test_book(&db, "b2").await;
    create_test_edition(&db, "e1", "b1").await;

    services::rate(&db, rate_input("alice", "b1", "e1", Some(5)))
        .await
        .unwrap();
    services::rate(&db, rate_input("bob", "b1", "e1", Some(4)))
        .await
        .unwrap();

    // Corrupt the denormalized fields behind the aggregator's back
    let mut active: book::ActiveModel = fetch_book(&db, "b1").await.into();
    active.average_rating = Set(Some(1.0));
    active.rating_count = Set(7);
    active.update(&db).await.unwrap();

    let processed = services::rebuild_all_ratings(&db).await.unwrap();
    assert_eq!(processed, 2);

    let stored = fetch_book(&db, "b1").await;
    assert_eq!(stored.rating_count, 2);
    assert_eq!(stored.average_rating, Some(4.5));
    assert_eq!(fetch_book(&db, "b2").await.rating_count, 0);
}
