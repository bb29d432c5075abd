//! Speaker rating aggregation.
//!
//! A speaker's `rating`/`reviewCount` are always re-derived from the full set
//! of reviews targeting that speaker; the recomputation never depends on the
//! previously stored value, so repeated invocations cannot drift. Both
//! storage backends call this same function so the rounded values are
//! identical regardless of backend.

/// Derived rating fields for one speaker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Arithmetic mean rounded to one decimal (half-up), 0 for no reviews
    pub rating: f64,
    pub review_count: i64,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        rating: 0.0,
        review_count: 0,
    };
}

/// Summarize the ratings of every review currently targeting one speaker.
pub fn summarize(ratings: &[i64]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary::EMPTY;
    }
    let sum: i64 = ratings.iter().sum();
    let mean = sum as f64 / ratings.len() as f64;
    RatingSummary {
        rating: round_to_tenth(mean),
        review_count: ratings.len() as i64,
    }
}

/// Round half-up on the tenths digit.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
