//! Rating values and the rules that guard them

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::DomainError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_BODY_CHARS: usize = 300;
pub const MAX_ID_CHARS: usize = 64;

/// Denormalized rating fields of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingAggregate {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub average_rating: Option<Decimal>,
    pub rating_count: i64,
}

impl RatingAggregate {
    pub fn empty() -> Self {
        Self {
            average_rating: None,
            rating_count: 0,
        }
    }

    /// Build the aggregate from the sum and count of non-null ratings
    pub fn from_totals(total: i64, count: i64) -> Self {
        Self {
            average_rating: round_average(total, count),
            rating_count: count.max(0),
        }
    }

    /// Rebuild from the stored columns
    pub fn from_stored(average_rating: Option<f64>, rating_count: i32) -> Self {
        Self {
            average_rating: average_rating
                .and_then(Decimal::from_f64_retain)
                .map(|d| d.round_dp(1)),
            rating_count: i64::from(rating_count),
        }
    }

    /// Average as stored in the REAL column
    pub fn average_as_f64(&self) -> Option<f64> {
        self.average_rating.and_then(|d| d.to_f64())
    }
}

/// Average rounded half-up to one decimal place, `None` when nothing is rated
pub fn round_average(total: i64, count: i64) -> Option<Decimal> {
    if count <= 0 {
        return None;
    }
    let avg = Decimal::from(total) / Decimal::from(count);
    Some(avg.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// A rating is either absent or a whole number of stars in range
pub fn validate_rating(rating: Option<i32>) -> Result<Option<i32>, DomainError> {
    match rating {
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => Err(DomainError::validation(
            format!("rating must be between {} and {}, got {}", MIN_RATING, MAX_RATING, r),
        )),
        other => Ok(other),
    }
}

/// Trims the body; blank bodies are stored as NULL
pub fn normalize_body(body: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(body) = body else {
        return Ok(None);
    };
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    if len > MAX_BODY_CHARS {
        return Err(DomainError::validation(format!(
            "review body is limited to {} characters, got {}",
            MAX_BODY_CHARS, len
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// Ids are opaque, but must be non-blank and bounded
pub fn validate_id(field: &str, id: &str) -> Result<String, DomainError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_ID_CHARS {
        return Err(DomainError::validation(format!(
            "{} is longer than {} characters",
            field, MAX_ID_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_average_half_up() {
        // 13 / 4 = 3.25, banker's rounding would give 3.2
        assert_eq!(round_average(13, 4), Some(Decimal::new(33, 1)));
        // 69 / 20 = 3.45
        assert_eq!(round_average(69, 20), Some(Decimal::new(35, 1)));
        // 3.44 stays down
        assert_eq!(round_average(86, 25), Some(Decimal::new(34, 1)));
        assert_eq!(round_average(10, 3), Some(Decimal::new(33, 1)));
        assert_eq!(round_average(7, 2), Some(Decimal::new(35, 1)));
    }

    #[test]
    fn test_round_average_empty_set() {
        assert_eq!(round_average(0, 0), None);
        assert_eq!(RatingAggregate::from_totals(0, 0), RatingAggregate::empty());
    }

    #[test]
    fn test_stored_round_trip_keeps_one_decimal() {
        let agg = RatingAggregate::from_totals(10, 3);
        let stored = agg.average_as_f64();
        assert_eq!(stored, Some(3.3));
        assert_eq!(RatingAggregate::from_stored(stored, 3), agg);
    }

    #[test]
    fn test_validate_rating_bounds() {
        assert_eq!(validate_rating(None), Ok(None));
        assert_eq!(validate_rating(Some(1)), Ok(Some(1)));
        assert_eq!(validate_rating(Some(5)), Ok(Some(5)));
        assert!(matches!(
            validate_rating(Some(0)),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            validate_rating(Some(6)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_normalize_body() {
        assert_eq!(normalize_body(None), Ok(None));
        assert_eq!(normalize_body(Some("   ".into())), Ok(None));
        assert_eq!(
            normalize_body(Some("  great read ".into())),
            Ok(Some("great read".to_string()))
        );
        // Limit counts characters, not bytes
        assert!(normalize_body(Some("é".repeat(300))).is_ok());
        assert!(matches!(
            normalize_body(Some("a".repeat(301))),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id("book_id", " b-1 "), Ok("b-1".to_string()));
        assert!(validate_id("book_id", "").is_err());
        assert!(validate_id("book_id", &"x".repeat(65)).is_err());
    }
}
