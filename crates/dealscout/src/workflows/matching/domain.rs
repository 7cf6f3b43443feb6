use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(raw.trim()).map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identifier of a candidate acquisition opportunity.
    DealId
);
entity_id!(
    /// Identifier of an investor's declared acquisition criteria.
    BuyBoxId
);
entity_id!(
    /// Isolated customer/organization scope. Not a rental occupant.
    TenantId
);
entity_id!(
    /// The investor user owning a buy box and receiving its alerts.
    UserId
);
entity_id!(NotificationId);

/// Lifecycle of a deal. Transitions are user-driven and never reversed
/// automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    New,
    Analyzing,
    Saved,
    Offered,
    UnderContract,
    Closed,
    Passed,
    Dead,
}

impl DealStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DealStatus::New => "new",
            DealStatus::Analyzing => "analyzing",
            DealStatus::Saved => "saved",
            DealStatus::Offered => "offered",
            DealStatus::UnderContract => "under_contract",
            DealStatus::Closed => "closed",
            DealStatus::Passed => "passed",
            DealStatus::Dead => "dead",
        }
    }

    /// Statuses still eligible as match candidates for a buy box run.
    pub const fn is_candidate(self) -> bool {
        !matches!(self, DealStatus::Passed | DealStatus::Dead)
    }
}

/// A listed or sourced property tracked per tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub tenant_id: TenantId,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub property_type: Option<String>,
    pub beds: Option<u32>,
    pub baths: Option<f64>,
    pub sqft: Option<u32>,
    pub year_built: Option<u16>,
    pub list_price: f64,
    pub hoa_monthly: Option<f64>,
    pub tax_annual: Option<f64>,
    pub insurance_annual: Option<f64>,
    pub estimated_rent: Option<f64>,
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An investor's acquisition criteria. Read-only to the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyBox {
    pub id: BuyBoxId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub name: String,
    pub markets: Vec<String>,
    pub property_types: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_beds: Option<u32>,
    pub max_beds: Option<u32>,
    pub min_baths: Option<f64>,
    pub max_baths: Option<f64>,
    pub min_sqft: Option<u32>,
    pub max_sqft: Option<u32>,
    pub min_year_built: Option<u16>,
    pub max_year_built: Option<u16>,
    pub strategy: Option<String>,
    pub target_cap_rate: Option<f64>,
    pub target_cash_on_cash: Option<f64>,
    pub min_dscr: Option<f64>,
    pub exclude_hoa: bool,
    pub max_hoa: Option<f64>,
    pub is_active: bool,
    pub last_matched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scored dimensions in fixed tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDimension {
    Price,
    Financial,
    Location,
    Property,
}

impl MatchDimension {
    pub const fn label(self) -> &'static str {
        match self {
            MatchDimension::Price => "Price",
            MatchDimension::Financial => "Financials",
            MatchDimension::Location => "Location",
            MatchDimension::Property => "Property",
        }
    }

    pub(crate) const fn tie_rank(self) -> u8 {
        match self {
            MatchDimension::Price => 0,
            MatchDimension::Financial => 1,
            MatchDimension::Location => 2,
            MatchDimension::Property => 3,
        }
    }
}

/// One explainable contribution to a composite score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReason {
    pub dimension: MatchDimension,
    pub detail: String,
    pub points: u8,
    pub max_points: u8,
}

/// Result of scoring one deal against one buy box. Pure scorer output;
/// persistence timestamps are attached by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub deal_id: DealId,
    pub buy_box_id: BuyBoxId,
    pub buy_box_name: String,
    pub user_id: UserId,
    pub match_score: u8,
    pub price_score: u8,
    pub financial_score: u8,
    pub location_score: u8,
    pub property_score: u8,
    pub is_match: bool,
    pub is_strong_match: bool,
    pub reasons: Vec<MatchReason>,
}

/// Swipe actions available on a deal card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeAction {
    Save,
    Pass,
}

impl SwipeAction {
    pub const fn resulting_status(self) -> DealStatus {
        match self {
            SwipeAction::Save => DealStatus::Saved,
            SwipeAction::Pass => DealStatus::Passed,
        }
    }
}
