use std::sync::atomic::Ordering;

use chrono::Utc;

use super::common::{harness, permissive_buy_box, sample_deal};
use crate::workflows::matching::domain::{NotificationId, TenantId, UserId};
use crate::workflows::matching::repository::{MatchAlertData, Notification, NotificationKind};

#[test]
fn strong_match_produces_one_notification_and_one_alert() {
    let fixture = harness();
    let tenant = TenantId::generate();
    let user = UserId::generate();
    let deal_id = fixture.store.seed_deal(sample_deal(tenant));
    let buy_box_id = fixture.store.seed_buy_box(permissive_buy_box(tenant, user));

    fixture.service.match_deal(tenant, deal_id).expect("run succeeds");

    let notifications = fixture.store.notifications();
    assert_eq!(notifications.len(), 1);
    let notification = &notifications[0];
    assert_eq!(notification.user_id, user);
    assert_eq!(notification.title, "New Match Found");
    assert_eq!(
        notification.message,
        "123 Main St matches buy box 'Midwest cashflow' with score 100%"
    );
    assert_eq!(notification.data.deal_id, deal_id);
    assert_eq!(notification.data.buy_box_id, buy_box_id);
    assert_eq!(notification.data.score, 100);
    assert!(!notification.is_read);

    let alerts = fixture.alerts.published();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].address, "123 Main St");
    assert_eq!(alerts[0].score, 100);
}

#[test]
fn weak_match_never_notifies() {
    let fixture = harness();
    let tenant = TenantId::generate();
    let deal_id = fixture.store.seed_deal(sample_deal(tenant));
    let mut buy_box = permissive_buy_box(tenant, UserId::generate());
    // 25% over budget zeroes the price dimension, leaving 70.
    buy_box.max_price = Some(200_000.0);
    fixture.store.seed_buy_box(buy_box);

    let report = fixture.service.match_deal(tenant, deal_id).expect("run succeeds");
    assert_eq!(report.matches[0].match_score, 70);
    assert!(fixture.store.notifications().is_empty());
    assert!(fixture.alerts.published().is_empty());
}

#[test]
fn unchanged_rerun_does_not_renotify() {
    let fixture = harness();
    let tenant = TenantId::generate();
    let deal_id = fixture.store.seed_deal(sample_deal(tenant));
    fixture
        .store
        .seed_buy_box(permissive_buy_box(tenant, UserId::generate()));

    fixture.service.match_deal(tenant, deal_id).expect("first run");
    fixture.service.match_deal(tenant, deal_id).expect("second run");

    assert_eq!(fixture.store.notifications().len(), 1);
    assert_eq!(fixture.alerts.published().len(), 1);
}

#[test]
fn materially_changed_score_notifies_again() {
    let fixture = harness();
    let tenant = TenantId::generate();
    let user = UserId::generate();
    let deal = sample_deal(tenant);
    let deal_id = fixture.store.seed_deal(deal);
    let buy_box = permissive_buy_box(tenant, user);
    let buy_box_id = fixture.store.seed_buy_box(buy_box.clone());

    // An unread alert from an earlier run at a score 10 points lower.
    fixture.store.seed_notification(Notification {
        id: NotificationId::generate(),
        tenant_id: tenant,
        user_id: user,
        kind: NotificationKind::Match,
        title: "New Match Found".to_string(),
        message: "stale".to_string(),
        data: MatchAlertData {
            deal_id,
            buy_box_id,
            buy_box_name: buy_box.name.clone(),
            score: 90,
        },
        is_read: false,
        created_at: Utc::now(),
    });

    fixture.service.match_deal(tenant, deal_id).expect("run succeeds");
    assert_eq!(fixture.store.notifications().len(), 2);
}

#[test]
fn small_score_drift_stays_quiet() {
    let fixture = harness();
    let tenant = TenantId::generate();
    let user = UserId::generate();
    let deal = sample_deal(tenant);
    let deal_id = fixture.store.seed_deal(deal);
    let buy_box = permissive_buy_box(tenant, user);
    let buy_box_id = fixture.store.seed_buy_box(buy_box.clone());

    fixture.store.seed_notification(Notification {
        id: NotificationId::generate(),
        tenant_id: tenant,
        user_id: user,
        kind: NotificationKind::Match,
        title: "New Match Found".to_string(),
        message: "recent".to_string(),
        data: MatchAlertData {
            deal_id,
            buy_box_id,
            buy_box_name: buy_box.name,
            score: 97,
        },
        is_read: false,
        created_at: Utc::now(),
    });

    fixture.service.match_deal(tenant, deal_id).expect("run succeeds");
    assert_eq!(fixture.store.notifications().len(), 1);
}

#[test]
fn notification_failures_never_fail_the_run() {
    let fixture = harness();
    let tenant = TenantId::generate();
    let deal_id = fixture.store.seed_deal(sample_deal(tenant));
    fixture
        .store
        .seed_buy_box(permissive_buy_box(tenant, UserId::generate()));
    fixture.store.fail_notifications.store(true, Ordering::SeqCst);

    let report = fixture.service.match_deal(tenant, deal_id).expect("run still succeeds");
    assert_eq!(report.strong_matches, 1);
    assert!(fixture.alerts.published().is_empty());
}

#[test]
fn alert_transport_failure_is_swallowed() {
    let fixture = harness();
    let tenant = TenantId::generate();
    let deal_id = fixture.store.seed_deal(sample_deal(tenant));
    fixture
        .store
        .seed_buy_box(permissive_buy_box(tenant, UserId::generate()));
    fixture.alerts.fail.store(true, Ordering::SeqCst);

    fixture.service.match_deal(tenant, deal_id).expect("run still succeeds");
    // The notification row still lands even when delivery fails.
    assert_eq!(fixture.store.notifications().len(), 1);
}
