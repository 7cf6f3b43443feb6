use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::domain::{
    BuyBoxId, Deal, DealId, DealStatus, MatchOutcome, SwipeAction, TenantId, UserId,
};
use super::notifications::trigger_strong_match_alerts;
use super::repository::{
    AlertPublisher, MatchRecord, MatchingStore, MetricsRecord, StoreError,
};
use super::scoring::{CriteriaError, MatchScorer, ScoringConfig};
use crate::workflows::import::{self, ImportError};
use crate::workflows::underwriting::{
    self, AssumptionOverrides, Assumptions, DealMetrics, UnderwritingError,
};

/// Error raised by the matching service facade.
#[derive(Debug, thiserror::Error)]
pub enum MatchingServiceError {
    #[error("deal not found")]
    DealNotFound,
    #[error("buy box not found")]
    BuyBoxNotFound,
    #[error(transparent)]
    Underwriting(#[from] UnderwritingError),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Report for one deal-side matching run, sorted by score descending.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRunReport {
    pub deal_id: DealId,
    pub matches: Vec<MatchOutcome>,
    pub total_matches: usize,
    pub strong_matches: usize,
    pub matched_at: DateTime<Utc>,
}

/// Outcome of a swipe. A failed matching run never fails the swipe itself.
#[derive(Debug, Clone, Serialize)]
pub struct SwipeSummary {
    pub status: DealStatus,
    pub match_count: usize,
    pub top_score: u8,
}

/// Request options for a buy-box-side matching run.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BuyBoxMatchOptions {
    pub min_score: Option<u8>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_metrics: bool,
}

const DEFAULT_BUY_BOX_MATCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct BuyBoxMatchEntry {
    pub outcome: MatchOutcome,
    pub deal: Deal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DealMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyBoxMatchSummary {
    pub total_matches: usize,
    pub avg_match_score: f64,
    pub top_markets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyBoxMatchReport {
    pub buy_box_id: BuyBoxId,
    pub buy_box_name: String,
    pub matches: Vec<BuyBoxMatchEntry>,
    pub summary: BuyBoxMatchSummary,
}

/// Query contract for listing persisted buy-box matches.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MatchesQuery {
    pub min_score: u8,
    pub status: Option<DealStatus>,
    pub sort_by: MatchSortKey,
    pub sort_order: SortOrder,
    pub page: usize,
    pub limit: usize,
}

impl Default for MatchesQuery {
    fn default() -> Self {
        Self {
            min_score: 0,
            status: None,
            sort_by: MatchSortKey::MatchScore,
            sort_order: SortOrder::Desc,
            page: 1,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSortKey {
    MatchScore,
    CreatedAt,
    ListPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistedMatch {
    pub record: MatchRecord,
    pub deal: Option<Deal>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PagedMatches {
    pub matches: Vec<PersistedMatch>,
    pub pagination: Pagination,
}

/// Per-row import results. `imported` counts successfully inserted deals even
/// when matching later failed for some of them.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    pub matched: usize,
    pub notes: Vec<String>,
}

/// Service composing the underwriting calculator, match scorer, persistence
/// upserts, and the notification trigger. All operations are tenant-scoped.
pub struct MatchingService<S, A> {
    store: Arc<S>,
    alerts: Arc<A>,
    scorer: MatchScorer,
}

impl<S, A> MatchingService<S, A>
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    pub fn new(store: Arc<S>, alerts: Arc<A>, config: ScoringConfig) -> Self {
        Self {
            store,
            alerts,
            scorer: MatchScorer::new(config),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run underwriting for one deal and persist the result. Validation
    /// failures propagate and nothing partial is written.
    pub fn analyze_deal(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
        overrides: &AssumptionOverrides,
    ) -> Result<MetricsRecord, MatchingServiceError> {
        let deal = self.require_deal(tenant_id, deal_id)?;
        let assumptions = Assumptions::default().with_overrides(overrides);
        let metrics = underwriting::calculate(&deal_inputs(&deal), assumptions)?;

        let record = MetricsRecord {
            deal_id,
            metrics,
            calculated_at: Utc::now(),
        };
        self.store.upsert_metrics(record.clone())?;

        if deal.status == DealStatus::New {
            if let Err(err) =
                self.store
                    .update_deal_status(tenant_id, deal_id, DealStatus::Analyzing, Utc::now())
            {
                warn!(deal = %deal_id, error = %err, "could not promote deal to analyzing");
            }
        }

        Ok(record)
    }

    /// Last persisted metrics for a deal, if any.
    pub fn latest_metrics(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
    ) -> Result<Option<MetricsRecord>, MatchingServiceError> {
        self.require_deal(tenant_id, deal_id)?;
        Ok(self.store.fetch_metrics(deal_id)?)
    }

    /// Score one deal against every active buy box of its tenant, upsert all
    /// results, and trigger strong-match notifications. A buy box that cannot
    /// be scored is skipped; a deal that cannot be underwritten falls back to
    /// the neutral financial score.
    pub fn match_deal(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
    ) -> Result<MatchRunReport, MatchingServiceError> {
        let deal = self.require_deal(tenant_id, deal_id)?;
        let metrics = self.ensure_metrics(&deal);
        let buy_boxes = self.store.active_buy_boxes(tenant_id)?;

        let mut scored: Vec<(MatchOutcome, DateTime<Utc>)> = Vec::new();
        for buy_box in buy_boxes {
            match self.scorer.score(&deal, metrics.as_ref(), &buy_box) {
                Ok(outcome) => scored.push((outcome, buy_box.created_at)),
                Err(err) => {
                    warn!(buy_box = %buy_box.id, error = %err,
                        "skipping buy box the scorer cannot honor");
                }
            }
        }

        // Score descending; ties resolved oldest buy box first so repeated
        // runs return identical orderings.
        scored.sort_by(|a, b| b.0.match_score.cmp(&a.0.match_score).then(a.1.cmp(&b.1)));
        let outcomes: Vec<MatchOutcome> = scored.into_iter().map(|(outcome, _)| outcome).collect();

        let matched_at = Utc::now();
        self.persist_outcomes(tenant_id, &outcomes, matched_at);
        trigger_strong_match_alerts(
            self.store.as_ref(),
            self.alerts.as_ref(),
            tenant_id,
            &deal,
            &outcomes,
            matched_at,
        );

        let strong_matches = outcomes
            .iter()
            .filter(|outcome| outcome.is_strong_match)
            .count();
        Ok(MatchRunReport {
            deal_id,
            total_matches: outcomes.len(),
            strong_matches,
            matches: outcomes,
            matched_at,
        })
    }

    /// Previously persisted matches for a deal, score descending.
    pub fn matches_for_deal(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
    ) -> Result<Vec<MatchRecord>, MatchingServiceError> {
        self.require_deal(tenant_id, deal_id)?;
        let mut records = self.store.matches_for_deal(tenant_id, deal_id)?;
        records.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(records)
    }

    /// Apply a swipe action. Saving triggers a matching run whose failure is
    /// isolated: the save still succeeds and reports zero matches.
    pub fn swipe(
        &self,
        tenant_id: TenantId,
        _user_id: UserId,
        deal_id: DealId,
        action: SwipeAction,
    ) -> Result<SwipeSummary, MatchingServiceError> {
        let status = action.resulting_status();
        self.store
            .update_deal_status(tenant_id, deal_id, status, Utc::now())
            .map_err(not_found_as_deal)?;

        if action != SwipeAction::Save {
            return Ok(SwipeSummary {
                status,
                match_count: 0,
                top_score: 0,
            });
        }

        match self.match_deal(tenant_id, deal_id) {
            Ok(report) => Ok(SwipeSummary {
                status,
                match_count: report.total_matches,
                top_score: report
                    .matches
                    .first()
                    .map(|outcome| outcome.match_score)
                    .unwrap_or(0),
            }),
            Err(err) => {
                error!(deal = %deal_id, error = %err, "matching after save failed (non-fatal)");
                Ok(SwipeSummary {
                    status,
                    match_count: 0,
                    top_score: 0,
                })
            }
        }
    }

    /// Score one buy box against every candidate deal of its tenant. All
    /// scored pairs are persisted; the report carries only those at or above
    /// the requested score floor.
    pub fn match_buy_box(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
        options: BuyBoxMatchOptions,
    ) -> Result<BuyBoxMatchReport, MatchingServiceError> {
        let buy_box = self
            .store
            .fetch_buy_box(tenant_id, buy_box_id)?
            .ok_or(MatchingServiceError::BuyBoxNotFound)?;

        let min_score = options
            .min_score
            .unwrap_or(self.scorer.config().min_score)
            .min(100);
        let limit = options.limit.unwrap_or(DEFAULT_BUY_BOX_MATCH_LIMIT);
        let scorer = MatchScorer::new(self.scorer.config().with_min_score(min_score));

        let matched_at = Utc::now();
        let mut entries: Vec<(BuyBoxMatchEntry, DateTime<Utc>)> = Vec::new();
        for deal in self.store.candidate_deals(tenant_id)? {
            let metrics = self.ensure_metrics(&deal);
            let outcome = scorer.score(&deal, metrics.as_ref(), &buy_box)?;
            self.persist_outcomes(tenant_id, std::slice::from_ref(&outcome), matched_at);
            if outcome.is_strong_match {
                trigger_strong_match_alerts(
                    self.store.as_ref(),
                    self.alerts.as_ref(),
                    tenant_id,
                    &deal,
                    std::slice::from_ref(&outcome),
                    matched_at,
                );
            }
            if outcome.match_score >= min_score {
                let created_at = deal.created_at;
                entries.push((
                    BuyBoxMatchEntry {
                        outcome,
                        metrics: options.include_metrics.then_some(metrics).flatten(),
                        deal,
                    },
                    created_at,
                ));
            }
        }

        entries.sort_by(|a, b| {
            b.0.outcome
                .match_score
                .cmp(&a.0.outcome.match_score)
                .then(a.1.cmp(&b.1))
        });
        entries.truncate(limit);
        let matches: Vec<BuyBoxMatchEntry> =
            entries.into_iter().map(|(entry, _)| entry).collect();

        let total_matches = matches.len();
        let avg_match_score = if total_matches == 0 {
            0.0
        } else {
            matches
                .iter()
                .map(|entry| f64::from(entry.outcome.match_score))
                .sum::<f64>()
                / total_matches as f64
        };
        let mut top_markets: Vec<String> = Vec::new();
        for entry in &matches {
            if !top_markets
                .iter()
                .any(|market| market.eq_ignore_ascii_case(&entry.deal.city))
            {
                top_markets.push(entry.deal.city.clone());
            }
        }

        Ok(BuyBoxMatchReport {
            buy_box_id,
            buy_box_name: buy_box.name,
            matches,
            summary: BuyBoxMatchSummary {
                total_matches,
                avg_match_score,
                top_markets,
            },
        })
    }

    /// Paginated persisted matches for one buy box.
    pub fn matches_for_buy_box(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
        query: MatchesQuery,
    ) -> Result<PagedMatches, MatchingServiceError> {
        self.store
            .fetch_buy_box(tenant_id, buy_box_id)?
            .ok_or(MatchingServiceError::BuyBoxNotFound)?;

        let mut rows: Vec<PersistedMatch> = self
            .store
            .matches_for_buy_box(tenant_id, buy_box_id)?
            .into_iter()
            .filter(|record| record.match_score >= query.min_score)
            .map(|record| {
                let deal = self
                    .store
                    .fetch_deal(tenant_id, record.deal_id)
                    .unwrap_or(None);
                PersistedMatch { record, deal }
            })
            .filter(|row| match query.status {
                None => true,
                Some(status) => row
                    .deal
                    .as_ref()
                    .is_some_and(|deal| deal.status == status),
            })
            .collect();

        rows.sort_by(|a, b| {
            let ordering = match query.sort_by {
                MatchSortKey::MatchScore => a.record.match_score.cmp(&b.record.match_score),
                MatchSortKey::CreatedAt => a.record.created_at.cmp(&b.record.created_at),
                MatchSortKey::ListPrice => {
                    let price = |row: &PersistedMatch| {
                        row.deal.as_ref().map(|deal| deal.list_price).unwrap_or(0.0)
                    };
                    price(a).total_cmp(&price(b))
                }
            };
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = rows.len();
        let limit = query.limit.max(1);
        let total_pages = total.div_ceil(limit).max(1);
        let page = query.page.clamp(1, total_pages);
        let start = (page - 1) * limit;
        let matches: Vec<PersistedMatch> =
            rows.into_iter().skip(start).take(limit).collect();

        Ok(PagedMatches {
            matches,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        })
    }

    /// Ingest a CSV of deals, inserting and matching row by row. A bad row or
    /// a failed matching run never aborts the rest of the import.
    pub fn import_deals(
        &self,
        tenant_id: TenantId,
        _user_id: UserId,
        csv: &str,
    ) -> Result<ImportReport, MatchingServiceError> {
        let rows = import::parse_deals(csv.as_bytes())?;

        let mut imported = 0usize;
        let mut failed = 0usize;
        let mut matched = 0usize;
        let mut notes = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let deal = match import::into_deal(row, tenant_id, Utc::now()) {
                Ok(deal) => deal,
                Err(err) => {
                    failed += 1;
                    notes.push(format!("row {}: {err}", index + 1));
                    continue;
                }
            };
            let deal_id = deal.id;
            if let Err(err) = self.store.insert_deal(deal) {
                failed += 1;
                notes.push(format!("row {}: {err}", index + 1));
                continue;
            }
            imported += 1;

            match self.match_deal(tenant_id, deal_id) {
                Ok(report) if report.total_matches > 0 => matched += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(deal = %deal_id, error = %err, "matching imported deal failed (non-fatal)");
                    notes.push(format!("row {}: matching failed", index + 1));
                }
            }
        }

        Ok(ImportReport {
            imported,
            failed,
            matched,
            notes,
        })
    }

    fn require_deal(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
    ) -> Result<Deal, MatchingServiceError> {
        self.store
            .fetch_deal(tenant_id, deal_id)?
            .ok_or(MatchingServiceError::DealNotFound)
    }

    /// Stored metrics when present, otherwise compute-and-persist when the
    /// deal has the required inputs. `None` means the financial dimension
    /// scores its neutral fallback.
    fn ensure_metrics(&self, deal: &Deal) -> Option<DealMetrics> {
        match self.store.fetch_metrics(deal.id) {
            Ok(Some(record)) => return Some(record.metrics),
            Ok(None) => {}
            Err(err) => {
                warn!(deal = %deal.id, error = %err, "metrics lookup failed");
            }
        }

        match underwriting::calculate(&deal_inputs(deal), Assumptions::default()) {
            Ok(metrics) => {
                let record = MetricsRecord {
                    deal_id: deal.id,
                    metrics: metrics.clone(),
                    calculated_at: Utc::now(),
                };
                if let Err(err) = self.store.upsert_metrics(record) {
                    warn!(deal = %deal.id, error = %err, "could not persist computed metrics");
                }
                Some(metrics)
            }
            Err(err) => {
                warn!(deal = %deal.id, error = %err,
                    "deal cannot be underwritten; financial score falls back to neutral");
                None
            }
        }
    }

    fn persist_outcomes(&self, tenant_id: TenantId, outcomes: &[MatchOutcome], at: DateTime<Utc>) {
        for outcome in outcomes {
            let record = MatchRecord::from_outcome(outcome, tenant_id, at);
            if let Err(err) = self.store.upsert_match(record) {
                warn!(deal = %outcome.deal_id, buy_box = %outcome.buy_box_id, error = %err,
                    "match upsert failed");
                continue;
            }
            if let Err(err) = self
                .store
                .touch_last_matched(tenant_id, outcome.buy_box_id, at)
            {
                warn!(buy_box = %outcome.buy_box_id, error = %err,
                    "could not update last_matched_at");
            }
        }
    }
}

fn deal_inputs(deal: &Deal) -> crate::workflows::underwriting::DealInputs {
    crate::workflows::underwriting::DealInputs {
        purchase_price: deal.list_price,
        estimated_rent: deal.estimated_rent.unwrap_or(0.0),
        property_taxes_annual: deal.tax_annual,
        insurance_annual: deal.insurance_annual,
        hoa_monthly: deal.hoa_monthly,
    }
}

fn not_found_as_deal(err: StoreError) -> MatchingServiceError {
    match err {
        StoreError::NotFound => MatchingServiceError::DealNotFound,
        other => MatchingServiceError::Store(other),
    }
}
