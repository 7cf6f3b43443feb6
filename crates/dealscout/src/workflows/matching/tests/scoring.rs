use super::common::{permissive_buy_box, sample_deal};
use crate::workflows::matching::domain::{MatchDimension, TenantId, UserId};
use crate::workflows::matching::scoring::{CriteriaError, MatchScorer, ScoringConfig};
use crate::workflows::underwriting::{self, Assumptions, DealInputs, DealMetrics};

fn metrics_for(deal: &crate::workflows::matching::domain::Deal) -> DealMetrics {
    let inputs = DealInputs {
        purchase_price: deal.list_price,
        estimated_rent: deal.estimated_rent.unwrap_or(0.0),
        property_taxes_annual: deal.tax_annual,
        insurance_annual: deal.insurance_annual,
        hoa_monthly: deal.hoa_monthly,
    };
    underwriting::calculate(&inputs, Assumptions::default()).expect("deal underwrites")
}

fn scorer() -> MatchScorer {
    MatchScorer::new(ScoringConfig::default())
}

#[test]
fn permissive_buy_box_scores_full_marks() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let metrics = metrics_for(&deal);
    let buy_box = permissive_buy_box(tenant, UserId::generate());

    let outcome = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");

    assert_eq!(outcome.match_score, 100);
    assert_eq!(outcome.price_score, 30);
    assert_eq!(outcome.financial_score, 30);
    assert_eq!(outcome.location_score, 20);
    assert_eq!(outcome.property_score, 20);
    assert!(outcome.is_match);
    assert!(outcome.is_strong_match);
    assert_eq!(outcome.reasons.len(), 4);
    assert_eq!(outcome.reasons[0].dimension, MatchDimension::Price);
}

#[test]
fn sub_scores_always_sum_to_composite() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let metrics = metrics_for(&deal);
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    buy_box.markets = vec!["Austin".to_string()];
    buy_box.target_cap_rate = Some(7.0);
    buy_box.target_cash_on_cash = Some(8.0);
    buy_box.min_dscr = Some(1.25);

    let outcome = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");

    let sum = u32::from(outcome.price_score)
        + u32::from(outcome.financial_score)
        + u32::from(outcome.location_score)
        + u32::from(outcome.property_score);
    assert_eq!(sum, u32::from(outcome.match_score));
    assert_eq!(outcome.location_score, 0);
    assert!(!outcome.is_match);
    // Zero-point dimensions never show up as reasons.
    assert!(outcome
        .reasons
        .iter()
        .all(|reason| reason.dimension != MatchDimension::Location));
}

#[test]
fn price_at_bound_earns_full_credit() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let metrics = metrics_for(&deal);
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    buy_box.max_price = Some(deal.list_price);

    let outcome = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");
    assert_eq!(outcome.price_score, 30);
}

#[test]
fn price_beyond_tolerance_earns_nothing() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let metrics = metrics_for(&deal);
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    // 250k list against a 200k ceiling is 25% over, past the 20% band.
    buy_box.max_price = Some(200_000.0);

    let outcome = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");
    assert_eq!(outcome.price_score, 0);
    assert_eq!(outcome.match_score, 70);
}

#[test]
fn price_overshoot_decays_linearly() {
    let tenant = TenantId::generate();
    let mut deal = sample_deal(tenant);
    deal.list_price = 220_000.0;
    let metrics = metrics_for(&deal);
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    // 10% over a 200k ceiling, half of the 20% band, earns half credit.
    buy_box.max_price = Some(200_000.0);

    let outcome = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");
    assert_eq!(outcome.price_score, 15);
}

#[test]
fn raising_a_target_never_raises_the_score() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let metrics = metrics_for(&deal);
    let user = UserId::generate();

    let mut previous = u8::MAX;
    for target in [5.0, 7.0, 10.0] {
        let mut buy_box = permissive_buy_box(tenant, user);
        buy_box.target_cap_rate = Some(target);
        let outcome = scorer()
            .score(&deal, Some(&metrics), &buy_box)
            .expect("criteria valid");
        assert!(outcome.match_score <= previous);
        previous = outcome.match_score;
    }
}

#[test]
fn missing_metrics_fall_back_to_neutral_financial() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let buy_box = permissive_buy_box(tenant, UserId::generate());

    let outcome = scorer().score(&deal, None, &buy_box).expect("criteria valid");
    assert_eq!(outcome.financial_score, 15);
    assert_eq!(outcome.match_score, 85);
}

#[test]
fn hoa_conflict_docks_the_financial_dimension() {
    let tenant = TenantId::generate();
    let mut deal = sample_deal(tenant);
    deal.hoa_monthly = Some(150.0);
    let metrics = metrics_for(&deal);
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    buy_box.exclude_hoa = true;

    let outcome = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");
    assert_eq!(outcome.financial_score, 24);
}

#[test]
fn inverted_range_is_rejected() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    buy_box.min_price = Some(300_000.0);
    buy_box.max_price = Some(200_000.0);

    let err = scorer()
        .score(&deal, None, &buy_box)
        .expect_err("inverted range must fail");
    assert!(matches!(err, CriteriaError::InvertedRange { field: "price", .. }));
}

#[test]
fn location_matches_zip_and_city_state_forms() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let user = UserId::generate();

    for market in ["50309", "des moines, ia", "Des Moines", "IA"] {
        let mut buy_box = permissive_buy_box(tenant, user);
        buy_box.markets = vec![market.to_string()];
        let outcome = scorer().score(&deal, None, &buy_box).expect("criteria valid");
        assert_eq!(outcome.location_score, 20, "market form {market:?}");
    }

    let mut buy_box = permissive_buy_box(tenant, user);
    buy_box.markets = vec!["Austin".to_string()];
    let outcome = scorer().score(&deal, None, &buy_box).expect("criteria valid");
    assert_eq!(outcome.location_score, 0);
}

#[test]
fn unknown_attribute_earns_half_of_a_constrained_part() {
    let tenant = TenantId::generate();
    let mut deal = sample_deal(tenant);
    deal.beds = None;
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    buy_box.min_beds = Some(3);

    let outcome = scorer().score(&deal, None, &buy_box).expect("criteria valid");
    // 8 (type) + 1.5 (unknown beds) + 3 + 3 + 3, rounded.
    assert_eq!(outcome.property_score, 19);
}

#[test]
fn scoring_is_deterministic() {
    let tenant = TenantId::generate();
    let deal = sample_deal(tenant);
    let metrics = metrics_for(&deal);
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    buy_box.target_cap_rate = Some(6.0);
    buy_box.markets = vec!["Des Moines".to_string()];

    let first = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");
    let second = scorer()
        .score(&deal, Some(&metrics), &buy_box)
        .expect("criteria valid");
    assert_eq!(first, second);
}
