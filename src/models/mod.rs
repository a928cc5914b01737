pub mod book;
pub mod edition;
pub mod review;
pub mod review_vote;
