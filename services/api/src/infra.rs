use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use dealscout::workflows::matching::{
    AlertError, AlertPublisher, BuyBox, BuyBoxId, BuyBoxStore, Deal, DealId, DealStatus, DealStore,
    MatchAlert, MatchRecord, MatchStore, MetricsRecord, MetricsStore, Notification,
    NotificationKind, NotificationStore, StoreError, TenantId, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local persistence backing the service until a database adapter
/// lands. Match rows are keyed per (deal, buy box) pair so recomputation
/// updates in place.
#[derive(Default)]
pub(crate) struct InMemoryMatchingStore {
    deals: Mutex<HashMap<DealId, Deal>>,
    buy_boxes: Mutex<HashMap<BuyBoxId, BuyBox>>,
    metrics: Mutex<HashMap<DealId, MetricsRecord>>,
    matches: Mutex<HashMap<(DealId, BuyBoxId), MatchRecord>>,
    notifications: Mutex<Vec<Notification>>,
}

impl InMemoryMatchingStore {
    pub(crate) fn seed_buy_box(&self, buy_box: BuyBox) -> BuyBoxId {
        let id = buy_box.id;
        self.buy_boxes
            .lock()
            .expect("buy box mutex poisoned")
            .insert(id, buy_box);
        id
    }

    pub(crate) fn deals_for(&self, tenant_id: TenantId) -> Vec<Deal> {
        let deals = self.deals.lock().expect("deal mutex poisoned");
        let mut rows: Vec<Deal> = deals
            .values()
            .filter(|deal| deal.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows
    }

    pub(crate) fn notifications_for(&self, user_id: UserId) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .iter()
            .filter(|notification| notification.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl DealStore for InMemoryMatchingStore {
    fn insert_deal(&self, deal: Deal) -> Result<Deal, StoreError> {
        let mut deals = self.deals.lock().expect("deal mutex poisoned");
        if deals.contains_key(&deal.id) {
            return Err(StoreError::Conflict);
        }
        deals.insert(deal.id, deal.clone());
        Ok(deal)
    }

    fn fetch_deal(&self, tenant_id: TenantId, deal_id: DealId) -> Result<Option<Deal>, StoreError> {
        let deals = self.deals.lock().expect("deal mutex poisoned");
        Ok(deals
            .get(&deal_id)
            .filter(|deal| deal.tenant_id == tenant_id)
            .cloned())
    }

    fn update_deal_status(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
        status: DealStatus,
        at: DateTime<Utc>,
    ) -> Result<Deal, StoreError> {
        let mut deals = self.deals.lock().expect("deal mutex poisoned");
        let deal = deals
            .get_mut(&deal_id)
            .filter(|deal| deal.tenant_id == tenant_id)
            .ok_or(StoreError::NotFound)?;
        deal.status = status;
        deal.updated_at = at;
        Ok(deal.clone())
    }

    fn candidate_deals(&self, tenant_id: TenantId) -> Result<Vec<Deal>, StoreError> {
        let deals = self.deals.lock().expect("deal mutex poisoned");
        let mut rows: Vec<Deal> = deals
            .values()
            .filter(|deal| deal.tenant_id == tenant_id && deal.status.is_candidate())
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }
}

impl BuyBoxStore for InMemoryMatchingStore {
    fn fetch_buy_box(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
    ) -> Result<Option<BuyBox>, StoreError> {
        let buy_boxes = self.buy_boxes.lock().expect("buy box mutex poisoned");
        Ok(buy_boxes
            .get(&buy_box_id)
            .filter(|buy_box| buy_box.tenant_id == tenant_id)
            .cloned())
    }

    fn active_buy_boxes(&self, tenant_id: TenantId) -> Result<Vec<BuyBox>, StoreError> {
        let buy_boxes = self.buy_boxes.lock().expect("buy box mutex poisoned");
        let mut rows: Vec<BuyBox> = buy_boxes
            .values()
            .filter(|buy_box| buy_box.tenant_id == tenant_id && buy_box.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    fn touch_last_matched(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut buy_boxes = self.buy_boxes.lock().expect("buy box mutex poisoned");
        let buy_box = buy_boxes
            .get_mut(&buy_box_id)
            .filter(|buy_box| buy_box.tenant_id == tenant_id)
            .ok_or(StoreError::NotFound)?;
        buy_box.last_matched_at = Some(at);
        Ok(())
    }
}

impl MetricsStore for InMemoryMatchingStore {
    fn fetch_metrics(&self, deal_id: DealId) -> Result<Option<MetricsRecord>, StoreError> {
        let metrics = self.metrics.lock().expect("metrics mutex poisoned");
        Ok(metrics.get(&deal_id).cloned())
    }

    fn upsert_metrics(&self, record: MetricsRecord) -> Result<(), StoreError> {
        let mut metrics = self.metrics.lock().expect("metrics mutex poisoned");
        metrics.insert(record.deal_id, record);
        Ok(())
    }
}

impl MatchStore for InMemoryMatchingStore {
    fn upsert_match(&self, mut record: MatchRecord) -> Result<MatchRecord, StoreError> {
        let mut matches = self.matches.lock().expect("match mutex poisoned");
        let key = (record.deal_id, record.buy_box_id);
        if let Some(existing) = matches.get(&key) {
            record.created_at = existing.created_at;
        }
        matches.insert(key, record.clone());
        Ok(record)
    }

    fn matches_for_deal(
        &self,
        tenant_id: TenantId,
        deal_id: DealId,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let matches = self.matches.lock().expect("match mutex poisoned");
        Ok(matches
            .values()
            .filter(|record| record.tenant_id == tenant_id && record.deal_id == deal_id)
            .cloned()
            .collect())
    }

    fn matches_for_buy_box(
        &self,
        tenant_id: TenantId,
        buy_box_id: BuyBoxId,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let matches = self.matches.lock().expect("match mutex poisoned");
        Ok(matches
            .values()
            .filter(|record| record.tenant_id == tenant_id && record.buy_box_id == buy_box_id)
            .cloned()
            .collect())
    }
}

impl NotificationStore for InMemoryMatchingStore {
    fn unread_match_notification(
        &self,
        user_id: UserId,
        deal_id: DealId,
        buy_box_id: BuyBoxId,
    ) -> Result<Option<Notification>, StoreError> {
        let notifications = self
            .notifications
            .lock()
            .expect("notification mutex poisoned");
        Ok(notifications
            .iter()
            .rev()
            .find(|notification| {
                notification.kind == NotificationKind::Match
                    && !notification.is_read
                    && notification.user_id == user_id
                    && notification.data.deal_id == deal_id
                    && notification.data.buy_box_id == buy_box_id
            })
            .cloned())
    }

    fn insert_notification(&self, notification: Notification) -> Result<(), StoreError> {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Alert delivery for the running service: a structured log line, until the
/// outbound e-mail integration plugs in behind the same trait.
#[derive(Default)]
pub(crate) struct LogAlertPublisher;

impl AlertPublisher for LogAlertPublisher {
    fn publish(&self, alert: MatchAlert) -> Result<(), AlertError> {
        info!(
            user = %alert.user_id,
            deal = %alert.deal_id,
            buy_box = %alert.buy_box_name,
            score = alert.score,
            "strong match alert"
        );
        Ok(())
    }
}

/// Collecting publisher for the CLI demo, so dispatched alerts can be printed
/// at the end of the run.
#[derive(Default)]
pub(crate) struct InMemoryAlertPublisher {
    events: Mutex<Vec<MatchAlert>>,
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<MatchAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: MatchAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}
