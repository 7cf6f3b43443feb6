/// Composite score at or above which a pair is a strong match and eligible to
/// trigger an alert. Fixed by product contract, not configurable per request.
pub const STRONG_MATCH_SCORE: u8 = 80;

/// Tunables for the match scorer. `min_score` may be overridden per request by
/// the HTTP contract; the price tolerance band is a deployment-level choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Composite score required for `is_match`.
    pub min_score: u8,
    /// Relative overshoot past a price bound at which price credit reaches 0.
    /// With 0.20, a deal priced 20% or more outside the range scores nothing
    /// on the price dimension; credit decays linearly inside the band.
    pub price_tolerance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 60,
            price_tolerance: 0.20,
        }
    }
}

impl ScoringConfig {
    pub fn with_min_score(self, min_score: u8) -> Self {
        Self { min_score, ..self }
    }
}
