//! Alert decision engine.
//!
//! Consumes complete sweep batches of (previous, current) snapshot pairs,
//! decides per domain whether an alert is due, composes the localized
//! message and hands it to the notification dispatcher. All per-domain
//! failures are logged and isolated; nothing here aborts a sweep.

pub mod decision;
pub mod message;

pub use decision::{ALERT_THROTTLE, AlertKind, evaluate, is_throttled};
pub use message::{AlertMessage, Locale, compose};

use crate::notify::Dispatcher;
use crate::scheduler::SweepResult;
use crate::storage::Storage;
use std::str::FromStr;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

pub struct AlertEngine<S> {
    storage: Arc<S>,
    dispatcher: Dispatcher,
    base_url: String,
}

impl<S: Storage> AlertEngine<S> {
    pub fn new(storage: Arc<S>, dispatcher: Dispatcher, base_url: String) -> Self {
        Self {
            storage,
            dispatcher,
            base_url,
        }
    }

    /// Run the decision logic over a complete sweep batch.
    #[tracing::instrument(skip_all, fields(batch = results.len()))]
    pub async fn process_batch(&self, results: &[SweepResult]) {
        for result in results {
            self.process_one(result).await;
        }
    }

    async fn process_one(&self, result: &SweepResult) {
        let domain_name = result.domain.domain_name.as_str();
        let user_id = result.domain.user_id;

        // First observation: nothing to diff against, and expiry alerting
        // starts with the next cycle.
        let Some(prev) = result.domain.snapshot.as_ref() else {
            debug!(domain = %domain_name, "first observation, skipping alert checks");
            return;
        };

        let now = OffsetDateTime::now_utc();
        if is_throttled(result.domain.last_alert_time, now) {
            debug!(domain = %domain_name, "alert suppressed by 24h throttle");
            return;
        }

        let prefs = match self.storage.notification_preferences(user_id).await {
            Ok(prefs) => prefs,
            Err(e) => {
                error!(domain = %domain_name, error = %e, "loading preferences failed");
                return;
            }
        };

        let Some(kind) = evaluate(prev, &result.current, &prefs, now) else {
            return;
        };

        let identity = match self.storage.channel_identity(user_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                warn!(domain = %domain_name, user_id, "no channel identity, alert dropped");
                return;
            }
            Err(e) => {
                error!(domain = %domain_name, error = %e, "loading channel identity failed");
                return;
            }
        };

        let locale = match Locale::from_str(&identity.lang) {
            Ok(locale) => locale,
            Err(e) => {
                error!(domain = %domain_name, user_id, error = %e, "alert not composed");
                return;
            }
        };

        let alert = compose(kind, domain_name, &result.current, locale, &self.base_url, now);
        let delivered = self.dispatcher.dispatch(&identity, &prefs, &alert).await;
        if delivered == 0 {
            return;
        }

        info!(
            domain = %domain_name,
            user_id,
            kind = kind.as_str(),
            delivered,
            "alert dispatched"
        );
        if let Err(e) = self
            .storage
            .update_last_alert_time(user_id, result.domain.id, now)
            .await
        {
            error!(domain = %domain_name, error = %e, "recording alert time failed");
        }
    }
}
