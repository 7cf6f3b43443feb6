use super::domain::{
    Assumptions, DealInputs, DealMetrics, ExpenseBreakdown, MetricRating, MetricRatings,
};

/// Price-derived fallbacks when a deal carries no tax or insurance records.
const ESTIMATED_TAX_RATE_ANNUAL: f64 = 0.012;
const ESTIMATED_INSURANCE_RATE_ANNUAL: f64 = 0.005;

/// DSCR is reported as this sentinel when there is no debt service at all.
const DSCR_NO_DEBT: f64 = 999.0;

pub const FIELD_PURCHASE_PRICE: &str = "Purchase Price";
pub const FIELD_ESTIMATED_RENT: &str = "Estimated Monthly Rent";

/// Error raised when the calculator cannot run at all. Callers must not
/// persist partial metrics or proceed to financial scoring on this error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnderwritingError {
    #[error("missing required underwriting inputs: {}", fields.join(", "))]
    MissingInputs { fields: Vec<String> },
}

impl UnderwritingError {
    pub fn fields(&self) -> &[String] {
        match self {
            UnderwritingError::MissingInputs { fields } => fields,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Standard fixed-rate amortization. A zero interest rate degrades to simple
/// principal division over the term.
fn monthly_mortgage(loan_amount: f64, annual_rate: f64, term_years: u32) -> f64 {
    if loan_amount <= 0.0 {
        return 0.0;
    }
    let payments = f64::from(term_years) * 12.0;
    if annual_rate <= 0.0 {
        return round2(loan_amount / payments);
    }

    let monthly_rate = annual_rate / 12.0;
    let growth = (1.0 + monthly_rate).powf(payments);
    round2(loan_amount * monthly_rate * growth / (growth - 1.0))
}

fn monthly_expenses(
    monthly_rent: f64,
    annual_taxes: f64,
    annual_insurance: f64,
    monthly_hoa: f64,
    assumptions: &Assumptions,
) -> ExpenseBreakdown {
    ExpenseBreakdown {
        property_taxes: round2(annual_taxes / 12.0),
        insurance: round2(annual_insurance / 12.0),
        hoa: round2(monthly_hoa),
        vacancy: round2(monthly_rent * assumptions.vacancy_rate),
        management: round2(monthly_rent * assumptions.management_rate),
        maintenance: round2(monthly_rent * assumptions.maintenance_rate),
        capex: round2(monthly_rent * assumptions.capex_rate),
    }
}

fn rate_metric(value: f64, excellent: f64, good: f64, fair: f64) -> MetricRating {
    if value >= excellent {
        MetricRating::Excellent
    } else if value >= good {
        MetricRating::Good
    } else if value >= fair {
        MetricRating::Fair
    } else {
        MetricRating::Poor
    }
}

/// Run the underwriting model for one deal. Pure and deterministic: identical
/// inputs and assumptions always produce identical metrics.
pub fn calculate(inputs: &DealInputs, assumptions: Assumptions) -> Result<DealMetrics, UnderwritingError> {
    let mut missing = Vec::new();
    if inputs.purchase_price <= 0.0 || !inputs.purchase_price.is_finite() {
        missing.push(FIELD_PURCHASE_PRICE.to_string());
    }
    if inputs.estimated_rent <= 0.0 || !inputs.estimated_rent.is_finite() {
        missing.push(FIELD_ESTIMATED_RENT.to_string());
    }
    if !missing.is_empty() {
        return Err(UnderwritingError::MissingInputs { fields: missing });
    }

    let price = inputs.purchase_price;
    let rent = inputs.estimated_rent;
    let annual_taxes = inputs
        .property_taxes_annual
        .filter(|taxes| *taxes > 0.0)
        .unwrap_or(price * ESTIMATED_TAX_RATE_ANNUAL);
    let annual_insurance = inputs
        .insurance_annual
        .filter(|premium| *premium > 0.0)
        .unwrap_or(price * ESTIMATED_INSURANCE_RATE_ANNUAL);
    let monthly_hoa = inputs.hoa_monthly.unwrap_or(0.0).max(0.0);

    let down_payment = round2(price * assumptions.down_payment_pct);
    let loan_amount = round2(price - down_payment);
    let mortgage = monthly_mortgage(
        loan_amount,
        assumptions.interest_rate,
        assumptions.loan_term_years,
    );
    let closing_costs = round2(price * assumptions.closing_cost_rate);
    let total_cash_required = round2(down_payment + closing_costs);

    let expenses = monthly_expenses(rent, annual_taxes, annual_insurance, monthly_hoa, &assumptions);
    let total_monthly_expenses = round2(expenses.total());

    let noi = round2((rent - total_monthly_expenses) * 12.0);
    let monthly_cash_flow = round2(rent - total_monthly_expenses - mortgage);
    let annual_cash_flow = round2(monthly_cash_flow * 12.0);

    let cap_rate = round2(noi / price * 100.0);
    let cash_on_cash = if total_cash_required > 0.0 {
        round2(annual_cash_flow / total_cash_required * 100.0)
    } else {
        0.0
    };
    let annual_debt_service = mortgage * 12.0;
    let dscr = if annual_debt_service > 0.0 {
        round2(noi / annual_debt_service)
    } else {
        DSCR_NO_DEBT
    };

    let ratings = MetricRatings {
        cap_rate: rate_metric(cap_rate, 10.0, 8.0, 6.0),
        cash_on_cash: rate_metric(cash_on_cash, 12.0, 10.0, 6.0),
        dscr: rate_metric(dscr, 1.5, 1.25, 1.0),
        cash_flow: rate_metric(monthly_cash_flow, 300.0, 200.0, 100.0),
    };

    Ok(DealMetrics {
        purchase_price: price,
        estimated_rent: rent,
        down_payment,
        loan_amount,
        monthly_mortgage: mortgage,
        closing_costs,
        total_cash_required,
        expenses,
        total_monthly_expenses,
        noi,
        monthly_cash_flow,
        annual_cash_flow,
        cap_rate,
        cash_on_cash,
        dscr,
        ratings,
        assumptions,
    })
}
