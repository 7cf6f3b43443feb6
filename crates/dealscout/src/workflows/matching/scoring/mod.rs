mod config;
mod rules;

pub use config::{ScoringConfig, STRONG_MATCH_SCORE};

use super::domain::{BuyBox, Deal, MatchDimension, MatchOutcome, MatchReason};
use crate::workflows::underwriting::DealMetrics;

/// Raised when a buy box carries criteria the scorer cannot honor. The
/// orchestrator skips the offending buy box and continues the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("buy box '{name}' has an inverted {field} range")]
    InvertedRange { name: String, field: &'static str },
}

/// Stateless scorer applying the configured thresholds to one (deal, buy box)
/// pair. Deterministic: identical inputs yield bit-identical outcomes.
pub struct MatchScorer {
    config: ScoringConfig,
}

impl MatchScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(
        &self,
        deal: &Deal,
        metrics: Option<&DealMetrics>,
        buy_box: &BuyBox,
    ) -> Result<MatchOutcome, CriteriaError> {
        validate_criteria(buy_box)?;

        let price = rules::score_price(deal, buy_box, self.config.price_tolerance);
        let financial = rules::score_financial(deal, metrics, buy_box);
        let location = rules::score_location(deal, buy_box);
        let property = rules::score_property(deal, buy_box);

        // Sub-scores round per dimension so the stored components always sum
        // to the composite.
        let price_score = clamp_points(price.points, rules::PRICE_WEIGHT);
        let financial_score = clamp_points(financial.points, rules::FINANCIAL_WEIGHT);
        let location_score = clamp_points(location.points, rules::LOCATION_WEIGHT);
        let property_score = clamp_points(property.points, rules::PROPERTY_WEIGHT);

        let match_score =
            (u32::from(price_score)
                + u32::from(financial_score)
                + u32::from(location_score)
                + u32::from(property_score))
            .min(100) as u8;

        let mut reasons: Vec<MatchReason> = [
            (MatchDimension::Price, price_score, rules::PRICE_WEIGHT, price.detail),
            (
                MatchDimension::Financial,
                financial_score,
                rules::FINANCIAL_WEIGHT,
                financial.detail,
            ),
            (
                MatchDimension::Location,
                location_score,
                rules::LOCATION_WEIGHT,
                location.detail,
            ),
            (
                MatchDimension::Property,
                property_score,
                rules::PROPERTY_WEIGHT,
                property.detail,
            ),
        ]
        .into_iter()
        .filter(|(_, points, _, _)| *points > 0)
        .map(|(dimension, points, weight, detail)| MatchReason {
            dimension,
            detail,
            points,
            max_points: weight as u8,
        })
        .collect();

        // Contribution descending; ties fall back to the fixed dimension order.
        reasons.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(a.dimension.tie_rank().cmp(&b.dimension.tie_rank()))
        });

        Ok(MatchOutcome {
            deal_id: deal.id,
            buy_box_id: buy_box.id,
            buy_box_name: buy_box.name.clone(),
            user_id: buy_box.user_id,
            match_score,
            price_score,
            financial_score,
            location_score,
            property_score,
            is_match: match_score >= self.config.min_score,
            is_strong_match: match_score >= STRONG_MATCH_SCORE,
            reasons,
        })
    }
}

fn clamp_points(points: f64, weight: f64) -> u8 {
    points.clamp(0.0, weight).round() as u8
}

fn validate_criteria(buy_box: &BuyBox) -> Result<(), CriteriaError> {
    let inverted = |field: &'static str| CriteriaError::InvertedRange {
        name: buy_box.name.clone(),
        field,
    };

    if let (Some(min), Some(max)) = (buy_box.min_price, buy_box.max_price) {
        if min > max {
            return Err(inverted("price"));
        }
    }
    if let (Some(min), Some(max)) = (buy_box.min_beds, buy_box.max_beds) {
        if min > max {
            return Err(inverted("beds"));
        }
    }
    if let (Some(min), Some(max)) = (buy_box.min_baths, buy_box.max_baths) {
        if min > max {
            return Err(inverted("baths"));
        }
    }
    if let (Some(min), Some(max)) = (buy_box.min_sqft, buy_box.max_sqft) {
        if min > max {
            return Err(inverted("sqft"));
        }
    }
    if let (Some(min), Some(max)) = (buy_box.min_year_built, buy_box.max_year_built) {
        if min > max {
            return Err(inverted("year built"));
        }
    }

    Ok(())
}
