use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    BuyBox, BuyBoxId, Deal, DealId, DealStatus, MatchOutcome, MatchReason, NotificationId,
    TenantId, UserId,
};
use crate::workflows::underwriting::DealMetrics;

/// Current-best-estimate metrics for one deal. One record per deal, upserted,
/// never appended; the assumption snapshot inside `metrics` keeps the result
/// reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub deal_id: DealId,
    pub metrics: DealMetrics,
    pub calculated_at: DateTime<Utc>,
}

/// Persisted join artifact between one deal and one buy box. Exactly one row
/// exists per `(deal_id, buy_box_id)` pair; recomputation updates in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub deal_id: DealId,
    pub buy_box_id: BuyBoxId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub buy_box_name: String,
    pub match_score: u8,
    pub price_score: u8,
    pub financial_score: u8,
    pub location_score: u8,
    pub property_score: u8,
    pub is_match: bool,
    pub is_strong_match: bool,
    pub reasons: Vec<MatchReason>,
    pub created_at: DateTime<Utc>,
    pub recomputed_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn from_outcome(outcome: &MatchOutcome, tenant_id: TenantId, at: DateTime<Utc>) -> Self {
        Self {
            deal_id: outcome.deal_id,
            buy_box_id: outcome.buy_box_id,
            tenant_id,
            user_id: outcome.user_id,
            buy_box_name: outcome.buy_box_name.clone(),
            match_score: outcome.match_score,
            price_score: outcome.price_score,
            financial_score: outcome.financial_score,
            location_score: outcome.location_score,
            property_score: outcome.property_score,
            is_match: outcome.is_match,
            is_strong_match: outcome.is_strong_match,
            reasons: outcome.reasons.clone(),
            created_at: at,
            recomputed_at: at,
        }
    }
}

/// Notification categories tracked by the engine. Only match alerts originate
/// here; other categories belong to the CRUD surfaces out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Match,
}

/// Structured payload attached to a match notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAlertData {
    pub deal_id: DealId,
    pub buy_box_id: BuyBoxId,
    pub buy_box_name: String,
    pub score: u8,
}

/// Persisted notification row. Append-only; only `is_read` mutates later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: MatchAlertData,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Deal rows, always tenant-scoped. A deal belonging to another tenant is
/// indistinguishable from an absent one.
pub trait DealStore: Send + Sync {
    fn insert_deal(&self, deal: Deal) -> Result<Deal, StoreError>;
    fn fetch_deal(&self, tenant_id: TenantId, deal_id: DealId) -> Result<Option<Deal>, StoreError>;
    fn update_deal_status(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
        status: DealStatus,
        at: DateTime<Utc>,
    ) -> Result<Deal, StoreError>;
    /// Deals still eligible as candidates for buy-box runs (not passed/dead).
    fn candidate_deals(&self, tenant_id: TenantId) -> Result<Vec<Deal>, StoreError>;
}

pub trait BuyBoxStore: Send + Sync {
    fn fetch_buy_box(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
    ) -> Result<Option<BuyBox>, StoreError>;
    /// Active buy boxes for one tenant, ordered by `created_at` ascending so
    /// batch runs are reproducible.
    fn active_buy_boxes(&self, tenant_id: TenantId) -> Result<Vec<BuyBox>, StoreError>;
    fn touch_last_matched(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

pub trait MetricsStore: Send + Sync {
    fn fetch_metrics(&self, deal_id: DealId) -> Result<Option<MetricsRecord>, StoreError>;
    /// Keyed on `deal_id`: replaces any existing record.
    fn upsert_metrics(&self, record: MetricsRecord) -> Result<(), StoreError>;
}

pub trait MatchStore: Send + Sync {
    /// Keyed on `(deal_id, buy_box_id)`. Implementations must keep exactly one
    /// row per pair and preserve the original `created_at` on update. This
    /// upsert is the serializing step that makes concurrent re-matching safe
    /// without application-level locks.
    fn upsert_match(&self, record: MatchRecord) -> Result<MatchRecord, StoreError>;
    fn matches_for_deal(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
    ) -> Result<Vec<MatchRecord>, StoreError>;
    fn matches_for_buy_box(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
    ) -> Result<Vec<MatchRecord>, StoreError>;
}

pub trait NotificationStore: Send + Sync {
    fn unread_match_notification(
        &self,
        user_id: UserId,
        deal_id: DealId,
        buy_box_id: BuyBoxId,
    ) -> Result<Option<Notification>, StoreError>;
    fn insert_notification(&self, notification: Notification) -> Result<(), StoreError>;
}

/// Everything the orchestration service needs from persistence.
pub trait MatchingStore:
    DealStore + BuyBoxStore + MetricsStore + MatchStore + NotificationStore
{
}

impl<T> MatchingStore for T where
    T: DealStore + BuyBoxStore + MetricsStore + MatchStore + NotificationStore
{
}

/// Outbound alert payload consumed by the delivery collaborator. Today that is
/// a log line; the e-mail service plugs in behind the same trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAlert {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub deal_id: DealId,
    pub buy_box_id: BuyBoxId,
    pub buy_box_name: String,
    pub address: String,
    pub score: u8,
}

pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: MatchAlert) -> Result<(), AlertError>;
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
