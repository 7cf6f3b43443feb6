//! Buy-box matching workflow: scoring deals against investor criteria,
//! persisting the results, and alerting on strong matches. The scorer itself
//! is pure; everything stateful goes through the store traits in
//! [`repository`].

pub mod domain;
pub(crate) mod notifications;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BuyBox, BuyBoxId, Deal, DealId, DealStatus, MatchDimension, MatchOutcome, MatchReason,
    NotificationId, SwipeAction, TenantId, UserId,
};
pub use notifications::RENOTIFY_SCORE_DELTA;
pub use repository::{
    AlertError, AlertPublisher, BuyBoxStore, DealStore, MatchAlert, MatchAlertData, MatchRecord,
    MatchStore, MatchingStore, MetricsRecord, MetricsStore, Notification, NotificationKind,
    NotificationStore, StoreError,
};
pub use router::matching_router;
pub use scoring::{CriteriaError, MatchScorer, ScoringConfig, STRONG_MATCH_SCORE};
pub use service::{
    BuyBoxMatchOptions, BuyBoxMatchReport, ImportReport, MatchRunReport, MatchesQuery,
    MatchingService, MatchingServiceError, PagedMatches, SwipeSummary,
};
