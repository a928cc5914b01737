//! Services Layer
//!
//! Business logic kept apart from the HTTP layer. Stores and the aggregator
//! take any `ConnectionTrait` so they can run inside a caller's transaction;
//! the coordinator (`review_service`) opens those transactions.

pub mod book_service;
pub mod rating_aggregator;
pub mod review_service;
pub mod review_store;
pub mod vote_store;
pub mod vote_tally;

// Re-export for convenience
pub use rating_aggregator::{get_book_rating, rebuild_all_ratings};
pub use review_service::{RateReview, ReviewWithVotes, delete_review, list_book_reviews, rate, vote};
pub use vote_tally::{get_user_votes, get_vote_counts};
