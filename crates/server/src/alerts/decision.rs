//! Pure alert eligibility rules: expiry window, change detection, throttle.

use crate::snapshot::{DomainSnapshot, has_changed};
use crate::storage::NotificationPreferences;
use time::{Duration, OffsetDateTime};

/// Minimum interval between alerts for the same (user, domain).
pub const ALERT_THROTTLE: Duration = Duration::hours(24);

/// What a single notification is about. At most one alert is sent per
/// domain per cycle; expiry outranks change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Expiry,
    Change,
}

impl AlertKind {
    /// Wire name used in webhook payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Expiry => "expiry_alert",
            AlertKind::Change => "change_alert",
        }
    }
}

/// True when the previous alert for this domain is less than
/// [`ALERT_THROTTLE`] old. A domain that has never alerted is not throttled.
pub fn is_throttled(last_alert_time: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    last_alert_time.is_some_and(|last| now - last < ALERT_THROTTLE)
}

/// Decide whether this (previous, current) pair warrants an alert, and of
/// which kind.
///
/// Expiry fires when `now` has passed `expires - before_days` and the user
/// wants expiry alerts. A snapshot without an expiry timestamp (persistent
/// probe failure) can never be an expiry event; the differ picks it up as a
/// change instead. When both kinds qualify, expiry wins.
pub fn evaluate(
    prev: &DomainSnapshot,
    current: &DomainSnapshot,
    prefs: &NotificationPreferences,
    now: OffsetDateTime,
) -> Option<AlertKind> {
    let expiry_eligible = prefs.expiry_alerts
        && current
            .expires
            .is_some_and(|expires| now > expires - Duration::days(i64::from(prefs.before_days)));
    if expiry_eligible {
        return Some(AlertKind::Expiry);
    }

    (prefs.change_alert && has_changed(prev, current)).then_some(AlertKind::Change)
}
