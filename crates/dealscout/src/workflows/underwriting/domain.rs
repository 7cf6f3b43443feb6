use serde::{Deserialize, Serialize};

/// Rate parameters applied to every calculation. All rates are fractions
/// (0.05 = 5%). A snapshot of the merged assumptions is stored alongside each
/// metrics record so results stay reproducible after defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub vacancy_rate: f64,
    pub maintenance_rate: f64,
    pub capex_rate: f64,
    pub management_rate: f64,
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub closing_cost_rate: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            vacancy_rate: 0.05,
            maintenance_rate: 0.05,
            capex_rate: 0.05,
            management_rate: 0.08,
            down_payment_pct: 0.25,
            interest_rate: 0.07,
            loan_term_years: 30,
            closing_cost_rate: 0.03,
        }
    }
}

impl Assumptions {
    /// Merge a partial override on top of these assumptions.
    pub fn with_overrides(self, overrides: &AssumptionOverrides) -> Self {
        Self {
            vacancy_rate: overrides.vacancy_rate.unwrap_or(self.vacancy_rate),
            maintenance_rate: overrides.maintenance_rate.unwrap_or(self.maintenance_rate),
            capex_rate: overrides.capex_rate.unwrap_or(self.capex_rate),
            management_rate: overrides.management_rate.unwrap_or(self.management_rate),
            down_payment_pct: overrides.down_payment_pct.unwrap_or(self.down_payment_pct),
            interest_rate: overrides.interest_rate.unwrap_or(self.interest_rate),
            loan_term_years: overrides.loan_term_years.unwrap_or(self.loan_term_years),
            closing_cost_rate: overrides
                .closing_cost_rate
                .unwrap_or(self.closing_cost_rate),
        }
    }
}

/// Caller-supplied partial override, deserialized from request payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionOverrides {
    pub vacancy_rate: Option<f64>,
    pub maintenance_rate: Option<f64>,
    pub capex_rate: Option<f64>,
    pub management_rate: Option<f64>,
    pub down_payment_pct: Option<f64>,
    pub interest_rate: Option<f64>,
    pub loan_term_years: Option<u32>,
    pub closing_cost_rate: Option<f64>,
}

/// Financial inputs for one property. Taxes and insurance fall back to
/// price-derived annual estimates when not tracked; HOA is a monthly figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealInputs {
    pub purchase_price: f64,
    pub estimated_rent: f64,
    pub property_taxes_annual: Option<f64>,
    pub insurance_annual: Option<f64>,
    pub hoa_monthly: Option<f64>,
}

/// Monthly operating expense breakdown (debt service excluded).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub property_taxes: f64,
    pub insurance: f64,
    pub hoa: f64,
    pub vacancy: f64,
    pub management: f64,
    pub maintenance: f64,
    pub capex: f64,
}

impl ExpenseBreakdown {
    pub fn total(&self) -> f64 {
        self.property_taxes
            + self.insurance
            + self.hoa
            + self.vacancy
            + self.management
            + self.maintenance
            + self.capex
    }
}

/// Qualitative band for a single metric, mirroring what the analysis UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRatings {
    pub cap_rate: MetricRating,
    pub cash_on_cash: MetricRating,
    pub dscr: MetricRating,
    pub cash_flow: MetricRating,
}

/// Standardized underwriting output for one deal. Dollar amounts are rounded
/// to cents, percentages to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealMetrics {
    pub purchase_price: f64,
    pub estimated_rent: f64,
    pub down_payment: f64,
    pub loan_amount: f64,
    pub monthly_mortgage: f64,
    pub closing_costs: f64,
    pub total_cash_required: f64,
    pub expenses: ExpenseBreakdown,
    pub total_monthly_expenses: f64,
    /// Annual net operating income: rental income minus operating expenses,
    /// excluding debt service.
    pub noi: f64,
    pub monthly_cash_flow: f64,
    pub annual_cash_flow: f64,
    pub cap_rate: f64,
    pub cash_on_cash: f64,
    pub dscr: f64,
    pub ratings: MetricRatings,
    pub assumptions: Assumptions,
}
