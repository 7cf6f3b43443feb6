use crate::infra::{InMemoryAlertPublisher, InMemoryMatchingStore};
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

use dealscout::error::AppError;
use dealscout::workflows::matching::{
    BuyBox, BuyBoxId, BuyBoxMatchOptions, MatchingService, ScoringConfig, TenantId, UserId,
};
use dealscout::workflows::underwriting::AssumptionOverrides;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the minimum composite score counted as a match
    #[arg(long)]
    pub(crate) min_score: Option<u8>,
    /// Print the per-dimension reasons for every reported match
    #[arg(long)]
    pub(crate) include_reasons: bool,
}

const DEMO_CSV: &str = "\
Address,City,State,Zip,Property Type,Beds,Baths,Sqft,Year Built,List Price,HOA Monthly,Tax Annual,Insurance Annual,Estimated Rent
123 Main St,Des Moines,IA,50309,single_family,3,2,1400,1998,250000,,3000,1250,2200
456 Oak Ln,Austin,TX,78701,condo,2,2,1100,2015,310000,240,5200,1400,2450
789 Elm St,Cedar Rapids,IA,52401,single_family,4,2.5,1850,1987,198000,,2600,1100,1900
,Nowhere,XX,00000,,,,,,150000,,,,
";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryMatchingStore::default());
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let mut scoring = ScoringConfig::default();
    if let Some(min_score) = args.min_score {
        scoring = scoring.with_min_score(min_score);
    }
    let service = MatchingService::new(store.clone(), alerts.clone(), scoring);

    let tenant = TenantId::generate();
    let investor = UserId::generate();
    let cashflow_box = store.seed_buy_box(midwest_cashflow_box(tenant, investor));
    store.seed_buy_box(sun_belt_box(tenant, investor));

    println!("Deal matching engine demo");
    println!("Tenant {tenant} | investor {investor}");

    println!("\nImporting listing CSV");
    let report = match service.import_deals(tenant, investor, DEMO_CSV) {
        Ok(report) => report,
        Err(err) => {
            println!("  Import failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- imported {} | failed {} | matched {}",
        report.imported, report.failed, report.matched
    );
    for note in &report.notes {
        println!("  note: {note}");
    }

    let deals = store.deals_for(tenant);
    let Some(featured) = deals.first() else {
        println!("No deals imported; nothing to underwrite");
        return Ok(());
    };

    println!("\nUnderwriting {}", featured.address_line1);
    match service.analyze_deal(tenant, featured.id, &AssumptionOverrides::default()) {
        Ok(record) => {
            let metrics = &record.metrics;
            println!(
                "- cash to close ${:.0} (down ${:.0} + closing ${:.0})",
                metrics.total_cash_required, metrics.down_payment, metrics.closing_costs
            );
            println!(
                "- monthly: rent ${:.0} | expenses ${:.2} | mortgage ${:.2} | cash flow ${:.2}",
                metrics.estimated_rent,
                metrics.total_monthly_expenses,
                metrics.monthly_mortgage,
                metrics.monthly_cash_flow
            );
            println!(
                "- cap rate {:.2}% | cash-on-cash {:.2}% | DSCR {:.2}",
                metrics.cap_rate, metrics.cash_on_cash, metrics.dscr
            );
        }
        Err(err) => println!("  Underwriting unavailable: {err}"),
    }

    println!("\nMatching {} against active buy boxes", featured.address_line1);
    match service.match_deal(tenant, featured.id) {
        Ok(run) => {
            println!(
                "- {} scored pairs, {} strong",
                run.total_matches, run.strong_matches
            );
            for outcome in &run.matches {
                println!(
                    "  {} -> {}% (price {} financial {} location {} property {})",
                    outcome.buy_box_name,
                    outcome.match_score,
                    outcome.price_score,
                    outcome.financial_score,
                    outcome.location_score,
                    outcome.property_score
                );
                if args.include_reasons {
                    for reason in &outcome.reasons {
                        println!(
                            "    {}/{} {}: {}",
                            reason.points,
                            reason.max_points,
                            reason.dimension.label(),
                            reason.detail
                        );
                    }
                }
            }
        }
        Err(err) => println!("  Matching unavailable: {err}"),
    }

    println!("\nRanking inventory for the cashflow buy box");
    match service.match_buy_box(tenant, cashflow_box, BuyBoxMatchOptions::default()) {
        Ok(report) => {
            println!(
                "- {} matches | avg score {:.1} | markets: {}",
                report.summary.total_matches,
                report.summary.avg_match_score,
                report.summary.top_markets.join(", ")
            );
            for entry in &report.matches {
                println!(
                    "  {} ({}) -> {}%",
                    entry.deal.address_line1,
                    entry.deal.status.label(),
                    entry.outcome.match_score
                );
            }
        }
        Err(err) => println!("  Buy box run unavailable: {err}"),
    }

    let notifications = store.notifications_for(investor);
    if notifications.is_empty() {
        println!("\nNotifications: none");
    } else {
        println!("\nNotifications");
        for notification in notifications {
            println!("- {}", notification.message);
        }
    }

    let events = alerts.events();
    if events.is_empty() {
        println!("External alerts: none dispatched");
    } else {
        println!("External alerts");
        for alert in events {
            println!(
                "- {} -> buy box '{}' at {}%",
                alert.address, alert.buy_box_name, alert.score
            );
        }
    }

    Ok(())
}

fn midwest_cashflow_box(tenant_id: TenantId, user_id: UserId) -> BuyBox {
    let at = Utc::now();
    BuyBox {
        id: BuyBoxId::generate(),
        tenant_id,
        user_id,
        name: "Midwest cashflow".to_string(),
        markets: vec!["Des Moines".to_string(), "Cedar Rapids".to_string()],
        property_types: vec!["single_family".to_string()],
        min_price: Some(100_000.0),
        max_price: Some(300_000.0),
        min_beds: Some(3),
        max_beds: None,
        min_baths: Some(1.5),
        max_baths: None,
        min_sqft: Some(1_000),
        max_sqft: None,
        min_year_built: Some(1960),
        max_year_built: None,
        strategy: Some("buy_and_hold".to_string()),
        target_cap_rate: Some(6.0),
        target_cash_on_cash: None,
        min_dscr: Some(1.0),
        exclude_hoa: true,
        max_hoa: None,
        is_active: true,
        last_matched_at: None,
        created_at: at,
        updated_at: at,
    }
}

fn sun_belt_box(tenant_id: TenantId, user_id: UserId) -> BuyBox {
    let at = Utc::now();
    BuyBox {
        id: BuyBoxId::generate(),
        tenant_id,
        user_id,
        name: "Sun Belt appreciation".to_string(),
        markets: vec!["Austin".to_string(), "TX".to_string()],
        property_types: vec!["condo".to_string(), "townhouse".to_string()],
        min_price: None,
        max_price: Some(350_000.0),
        min_beds: Some(2),
        max_beds: None,
        min_baths: None,
        max_baths: None,
        min_sqft: None,
        max_sqft: None,
        min_year_built: Some(2000),
        max_year_built: None,
        strategy: Some("appreciation".to_string()),
        target_cap_rate: None,
        target_cash_on_cash: None,
        min_dscr: None,
        exclude_hoa: false,
        max_hoa: Some(400.0),
        is_active: true,
        last_matched_at: None,
        created_at: at,
        updated_at: at,
    }
}
