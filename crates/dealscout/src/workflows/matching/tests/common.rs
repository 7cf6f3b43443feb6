use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use crate::workflows::matching::domain::{
    BuyBox, BuyBoxId, Deal, DealId, DealStatus, TenantId, UserId,
};
use crate::workflows::matching::repository::{
    AlertError, AlertPublisher, BuyBoxStore, DealStore, MatchAlert, MatchRecord, MatchStore,
    MetricsRecord, MetricsStore, Notification, NotificationKind, NotificationStore, StoreError,
};
use crate::workflows::matching::scoring::ScoringConfig;
use crate::workflows::matching::service::MatchingService;

/// In-memory store double with switchable failure injection per concern.
#[derive(Default)]
pub(crate) struct MemoryStore {
    deals: Mutex<HashMap<DealId, Deal>>,
    buy_boxes: Mutex<HashMap<BuyBoxId, BuyBox>>,
    metrics: Mutex<HashMap<DealId, MetricsRecord>>,
    matches: Mutex<HashMap<(DealId, BuyBoxId), MatchRecord>>,
    notifications: Mutex<Vec<Notification>>,
    pub(crate) fail_buy_boxes: AtomicBool,
    pub(crate) fail_notifications: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn seed_deal(&self, deal: Deal) -> DealId {
        let id = deal.id;
        self.deals
            .lock()
            .expect("deal mutex poisoned")
            .insert(id, deal);
        id
    }

    pub(crate) fn seed_buy_box(&self, buy_box: BuyBox) -> BuyBoxId {
        let id = buy_box.id;
        self.buy_boxes
            .lock()
            .expect("buy box mutex poisoned")
            .insert(id, buy_box);
        id
    }

    pub(crate) fn seed_notification(&self, notification: Notification) {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
    }

    pub(crate) fn deal(&self, deal_id: DealId) -> Option<Deal> {
        self.deals
            .lock()
            .expect("deal mutex poisoned")
            .get(&deal_id)
            .cloned()
    }

    pub(crate) fn buy_box(&self, buy_box_id: BuyBoxId) -> Option<BuyBox> {
        self.buy_boxes
            .lock()
            .expect("buy box mutex poisoned")
            .get(&buy_box_id)
            .cloned()
    }

    pub(crate) fn match_row(&self, deal_id: DealId, buy_box_id: BuyBoxId) -> Option<MatchRecord> {
        self.matches
            .lock()
            .expect("match mutex poisoned")
            .get(&(deal_id, buy_box_id))
            .cloned()
    }

    pub(crate) fn match_count(&self) -> usize {
        self.matches.lock().expect("match mutex poisoned").len()
    }

    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl DealStore for MemoryStore {
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
        at: chrono::DateTime<Utc>,
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

impl BuyBoxStore for MemoryStore {
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
        if self.fail_buy_boxes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("buy box listing down".to_string()));
        }
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
        at: chrono::DateTime<Utc>,
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

impl MetricsStore for MemoryStore {
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

impl MatchStore for MemoryStore {
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

impl NotificationStore for MemoryStore {
    fn unread_match_notification(
        &self,
        user_id: UserId,
        deal_id: DealId,
        buy_box_id: BuyBoxId,
    ) -> Result<Option<Notification>, StoreError> {
        let notifications = self.notifications.lock().expect("notification mutex poisoned");
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
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("notification store down".to_string()));
        }
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Recording alert publisher.
#[derive(Default)]
pub(crate) struct MemoryAlerts {
    published: Mutex<Vec<MatchAlert>>,
    pub(crate) fail: AtomicBool,
}

impl MemoryAlerts {
    pub(crate) fn published(&self) -> Vec<MatchAlert> {
        self.published.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: MatchAlert) -> Result<(), AlertError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AlertError::Transport("smtp down".to_string()));
        }
        self.published
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(crate) struct Harness {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) alerts: Arc<MemoryAlerts>,
    pub(crate) service: Arc<MatchingService<MemoryStore, MemoryAlerts>>,
}

pub(crate) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service = Arc::new(MatchingService::new(
        Arc::clone(&store),
        Arc::clone(&alerts),
        ScoringConfig::default(),
    ));
    Harness {
        store,
        alerts,
        service,
    }
}

/// A clean single-family deal with enough data to underwrite.
pub(crate) fn sample_deal(tenant_id: TenantId) -> Deal {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp");
    Deal {
        id: DealId::generate(),
        tenant_id,
        address_line1: "123 Main St".to_string(),
        city: "Des Moines".to_string(),
        state: "IA".to_string(),
        zip: "50309".to_string(),
        property_type: Some("single_family".to_string()),
        beds: Some(3),
        baths: Some(2.0),
        sqft: Some(1400),
        year_built: Some(1998),
        list_price: 250_000.0,
        hoa_monthly: None,
        tax_annual: Some(3_000.0),
        insurance_annual: Some(1_250.0),
        estimated_rent: Some(2_200.0),
        status: DealStatus::New,
        created_at: at,
        updated_at: at,
    }
}

/// A buy box with no restrictions at all; every deal scores 100 against it.
pub(crate) fn permissive_buy_box(tenant_id: TenantId, user_id: UserId) -> BuyBox {
    let at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).single().expect("valid timestamp");
    BuyBox {
        id: BuyBoxId::generate(),
        tenant_id,
        user_id,
        name: "Midwest cashflow".to_string(),
        markets: Vec::new(),
        property_types: Vec::new(),
        min_price: None,
        max_price: None,
        min_beds: None,
        max_beds: None,
        min_baths: None,
        max_baths: None,
        min_sqft: None,
        max_sqft: None,
        min_year_built: None,
        max_year_built: None,
        strategy: None,
        target_cap_rate: None,
        target_cash_on_cash: None,
        min_dscr: None,
        exclude_hoa: false,
        max_hoa: None,
        is_active: true,
        last_matched_at: None,
        created_at: at,
        updated_at: at,
    }
}
