use super::super::domain::{BuyBox, Deal};
use crate::workflows::underwriting::DealMetrics;

pub(crate) const PRICE_WEIGHT: f64 = 30.0;
pub(crate) const FINANCIAL_WEIGHT: f64 = 30.0;
pub(crate) const LOCATION_WEIGHT: f64 = 20.0;
pub(crate) const PROPERTY_WEIGHT: f64 = 20.0;

/// Financial sub-shares: cap rate and cash-on-cash each carry 35% of the
/// dimension, DSCR the remaining 30%. Near-target credit (within 90% of a
/// target) is worth 20% of the dimension.
const CAP_RATE_SHARE: f64 = FINANCIAL_WEIGHT * 0.35;
const CASH_ON_CASH_SHARE: f64 = FINANCIAL_WEIGHT * 0.35;
const DSCR_SHARE: f64 = FINANCIAL_WEIGHT * 0.30;
const NEAR_TARGET_SHARE: f64 = FINANCIAL_WEIGHT * 0.20;
const NEAR_TARGET_RATIO: f64 = 0.9;
const HOA_PENALTY: f64 = FINANCIAL_WEIGHT * 0.20;

/// When metrics are unavailable the dimension is scored at half weight:
/// missing data is treated as neutral rather than as a failed fit.
const FINANCIAL_NEUTRAL: f64 = FINANCIAL_WEIGHT * 0.5;

/// Property sub-parts: type carries 8 of 20, each physical range 3.
const TYPE_PART: f64 = 8.0;
const RANGE_PART: f64 = 3.0;

pub(crate) struct DimensionScore {
    pub(crate) points: f64,
    pub(crate) detail: String,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Full credit inside the declared range (bounds inclusive) or when no bounds
/// are declared; outside, credit decays linearly with the relative distance
/// past the nearer bound and reaches zero at `tolerance` overshoot.
pub(crate) fn score_price(deal: &Deal, buy_box: &BuyBox, tolerance: f64) -> DimensionScore {
    let price = deal.list_price;
    let (min, max) = (buy_box.min_price, buy_box.max_price);

    if min.is_none() && max.is_none() {
        return DimensionScore {
            points: PRICE_WEIGHT,
            detail: "no price restrictions".to_string(),
        };
    }

    let floor = min.unwrap_or(0.0);
    let ceiling = max.unwrap_or(f64::INFINITY);
    if price >= floor && price <= ceiling {
        return DimensionScore {
            points: PRICE_WEIGHT,
            detail: format!("list price ${price:.0} within target range"),
        };
    }

    let (overshoot, side) = if price > ceiling {
        ((price - ceiling) / ceiling, "above maximum")
    } else {
        ((floor - price) / floor, "below minimum")
    };

    let points = if overshoot >= tolerance {
        0.0
    } else {
        PRICE_WEIGHT * (1.0 - overshoot / tolerance)
    };

    DimensionScore {
        points,
        detail: format!("list price {:.0}% {side}", overshoot * 100.0),
    }
}

/// Full credit when the market list is empty or the deal's city, state, zip,
/// or "city, state" matches one of the declared markets (case-insensitive).
pub(crate) fn score_location(deal: &Deal, buy_box: &BuyBox) -> DimensionScore {
    if buy_box.markets.is_empty() {
        return DimensionScore {
            points: LOCATION_WEIGHT,
            detail: "no market restrictions".to_string(),
        };
    }

    let city = normalize(&deal.city);
    let state = normalize(&deal.state);
    let zip = deal.zip.trim().to_string();
    let city_state = format!("{city}, {state}");

    for market in &buy_box.markets {
        let norm = normalize(market);
        if norm == city || norm == state || norm == zip || norm == city_state {
            return DimensionScore {
                points: LOCATION_WEIGHT,
                detail: format!("location matches {market}"),
            };
        }
    }

    DimensionScore {
        points: 0.0,
        detail: "location not in target markets".to_string(),
    }
}

/// Partial credit per satisfied sub-criterion. An unconstrained sub-criterion
/// earns its part outright; a constrained one with an unknown deal attribute
/// earns half, since missing data is not a failed fit.
pub(crate) fn score_property(deal: &Deal, buy_box: &BuyBox) -> DimensionScore {
    let mut points = 0.0;
    let mut satisfied: Vec<String> = Vec::new();

    if buy_box.property_types.is_empty() {
        points += TYPE_PART;
    } else {
        match &deal.property_type {
            Some(property_type) => {
                let wanted = buy_box
                    .property_types
                    .iter()
                    .any(|candidate| normalize(candidate) == normalize(property_type));
                if wanted {
                    points += TYPE_PART;
                    satisfied.push(format!("{property_type} matches target types"));
                }
            }
            None => points += TYPE_PART * 0.5,
        }
    }

    points += range_part(
        deal.beds.map(f64::from),
        buy_box.min_beds.map(f64::from),
        buy_box.max_beds.map(f64::from),
        "beds",
        &mut satisfied,
    );
    points += range_part(
        deal.baths,
        buy_box.min_baths,
        buy_box.max_baths,
        "baths",
        &mut satisfied,
    );
    points += range_part(
        deal.sqft.map(f64::from),
        buy_box.min_sqft.map(f64::from),
        buy_box.max_sqft.map(f64::from),
        "sqft",
        &mut satisfied,
    );
    points += range_part(
        deal.year_built.map(f64::from),
        buy_box.min_year_built.map(f64::from),
        buy_box.max_year_built.map(f64::from),
        "year built",
        &mut satisfied,
    );

    let detail = if satisfied.is_empty() {
        if points >= PROPERTY_WEIGHT {
            "no property restrictions".to_string()
        } else {
            "property criteria partially met".to_string()
        }
    } else {
        format!("criteria met: {}", satisfied.join(", "))
    };

    DimensionScore { points, detail }
}

fn range_part(
    value: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    label: &str,
    satisfied: &mut Vec<String>,
) -> f64 {
    if min.is_none() && max.is_none() {
        return RANGE_PART;
    }
    match value {
        Some(actual) => {
            let fits = min.map_or(true, |bound| actual >= bound)
                && max.map_or(true, |bound| actual <= bound);
            if fits {
                satisfied.push(format!("{actual} {label}"));
                RANGE_PART
            } else {
                0.0
            }
        }
        None => RANGE_PART * 0.5,
    }
}

/// Proportional credit per financial target met or exceeded. Absent metrics
/// score the neutral half weight. Raising a target can only hold or lower the
/// resulting score.
pub(crate) fn score_financial(
    deal: &Deal,
    metrics: Option<&DealMetrics>,
    buy_box: &BuyBox,
) -> DimensionScore {
    let Some(metrics) = metrics else {
        return DimensionScore {
            points: FINANCIAL_NEUTRAL,
            detail: "financial metrics not yet calculated".to_string(),
        };
    };

    let mut points = 0.0;
    let mut notes: Vec<String> = Vec::new();

    points += target_credit(
        metrics.cap_rate,
        buy_box.target_cap_rate,
        CAP_RATE_SHARE,
        "cap rate",
        "%",
        &mut notes,
    );
    points += target_credit(
        metrics.cash_on_cash,
        buy_box.target_cash_on_cash,
        CASH_ON_CASH_SHARE,
        "cash-on-cash",
        "%",
        &mut notes,
    );

    match buy_box.min_dscr {
        None => points += DSCR_SHARE,
        Some(min_dscr) => {
            if metrics.dscr >= min_dscr {
                points += DSCR_SHARE;
                notes.push(format!("DSCR {:.2} meets minimum", metrics.dscr));
            }
        }
    }

    let hoa = deal.hoa_monthly.unwrap_or(0.0);
    let hoa_excluded = buy_box.exclude_hoa && hoa > 0.0;
    let hoa_over_cap = buy_box.max_hoa.is_some_and(|cap| hoa > cap);
    if hoa_excluded || hoa_over_cap {
        points = (points - HOA_PENALTY).max(0.0);
        notes.push("HOA conflicts with criteria".to_string());
    }

    let detail = if notes.is_empty() {
        "financial targets not met".to_string()
    } else {
        notes.join(", ")
    };

    DimensionScore { points, detail }
}

fn target_credit(
    actual: f64,
    target: Option<f64>,
    full_share: f64,
    label: &str,
    unit: &str,
    notes: &mut Vec<String>,
) -> f64 {
    match target {
        None => full_share,
        Some(target) if actual >= target => {
            notes.push(format!("{label} {actual:.2}{unit} meets target"));
            full_share
        }
        Some(target) if actual >= target * NEAR_TARGET_RATIO => {
            notes.push(format!("{label} {actual:.2}{unit} near target"));
            NEAR_TARGET_SHARE
        }
        Some(_) => 0.0,
    }
}
