use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{Deal, MatchOutcome, NotificationId, TenantId};
use super::repository::{
    AlertPublisher, MatchAlert, MatchAlertData, Notification, NotificationKind, NotificationStore,
};

/// A re-run over an unchanged pair must not re-notify; a score that moved by
/// at least this much counts as a material change and produces a fresh alert
/// even while an older unread one exists.
pub const RENOTIFY_SCORE_DELTA: u8 = 5;

/// Emit at most one unread notification per (user, deal, buy box) triple for
/// the strong matches of one run. Every failure here is logged and swallowed:
/// alerting must never fail the action that triggered the matching run.
pub(crate) fn trigger_strong_match_alerts<S, A>(
    store: &S,
    alerts: &A,
    tenant_id: TenantId,
    deal: &Deal,
    outcomes: &[MatchOutcome],
    at: DateTime<Utc>,
) where
    S: NotificationStore + ?Sized,
    A: AlertPublisher + ?Sized,
{
    for outcome in outcomes.iter().filter(|outcome| outcome.is_strong_match) {
        let existing =
            match store.unread_match_notification(outcome.user_id, deal.id, outcome.buy_box_id) {
                Ok(existing) => existing,
                Err(err) => {
                    warn!(deal = %deal.id, buy_box = %outcome.buy_box_id, error = %err,
                        "could not check for prior match notification");
                    continue;
                }
            };

        if let Some(prior) = existing {
            if outcome.match_score.abs_diff(prior.data.score) < RENOTIFY_SCORE_DELTA {
                continue;
            }
        }

        let notification = Notification {
            id: NotificationId::generate(),
            tenant_id,
            user_id: outcome.user_id,
            kind: NotificationKind::Match,
            title: "New Match Found".to_string(),
            message: format!(
                "{} matches buy box '{}' with score {}%",
                deal.address_line1, outcome.buy_box_name, outcome.match_score
            ),
            data: MatchAlertData {
                deal_id: deal.id,
                buy_box_id: outcome.buy_box_id,
                buy_box_name: outcome.buy_box_name.clone(),
                score: outcome.match_score,
            },
            is_read: false,
            created_at: at,
        };

        if let Err(err) = store.insert_notification(notification) {
            warn!(deal = %deal.id, buy_box = %outcome.buy_box_id, error = %err,
                "failed to persist match notification");
            continue;
        }

        let alert = MatchAlert {
            tenant_id,
            user_id: outcome.user_id,
            deal_id: deal.id,
            buy_box_id: outcome.buy_box_id,
            buy_box_name: outcome.buy_box_name.clone(),
            address: deal.address_line1.clone(),
            score: outcome.match_score,
        };
        if let Err(err) = alerts.publish(alert) {
            warn!(deal = %deal.id, buy_box = %outcome.buy_box_id, error = %err,
                "match alert delivery failed");
        }
    }
}
