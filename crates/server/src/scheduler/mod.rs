//! Polling scheduler: drives the prober across many domains with bounded
//! concurrency and per-probe deadlines.
//!
//! Two entry points share one fan-out primitive: the system-wide periodic
//! sweep and the cooldown-gated on-demand check for a single user. Both
//! await every probe task before the batch is handed to the alert stage, so
//! diffing always sees a complete batch.

use crate::alerts::AlertEngine;
use crate::config::PollConfig;
use crate::probe;
use crate::snapshot::DomainSnapshot;
use crate::storage::{Storage, TrackedDomain};
use sea_orm::DbErr;
use std::future::Future;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Duration;
use tracing::{error, info};

/// One probed domain: the tracked row as it was before the sweep (carrying
/// the previous snapshot) plus the freshly taken snapshot.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub domain: TrackedDomain,
    pub current: DomainSnapshot,
}

/// Outcome of an on-demand check, reported to the user in aggregate only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnDemandOutcome {
    /// The previous check is too recent; nothing was probed.
    TooSoon,
    /// All of the user's domains were probed and persisted.
    Completed { checked: usize },
}

/// Run `run` over every item with at most `limit` tasks in flight, and
/// return only once every task has finished. One task's panic or failure
/// never aborts the others; panicked tasks are logged and dropped from the
/// result set.
pub async fn bounded_sweep<T, R, F, Fut>(items: Vec<T>, limit: usize, run: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit));
    let run = Arc::new(run);
    let mut tasks = JoinSet::new();

    for item in items {
        let semaphore = semaphore.clone();
        let run = run.clone();
        tasks.spawn(async move {
            // Never closed, so acquire only fails if the semaphore is
            // dropped, which the Arc prevents.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("sweep semaphore closed");
            run(item).await
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => error!(error = %e, "sweep task failed to join"),
        }
    }
    results
}

/// Probe a batch of tracked domains and persist each snapshot as it lands.
/// Returns the complete (previous, current) batch for the alert stage.
async fn sweep_domains<S: Storage + 'static>(
    storage: &Arc<S>,
    domains: Vec<TrackedDomain>,
    concurrency: usize,
    deadline: Duration,
) -> Vec<SweepResult> {
    let storage = storage.clone();
    bounded_sweep(domains, concurrency, move |domain: TrackedDomain| {
        let storage = storage.clone();
        async move {
            let current = probe::poll_domain(&domain.domain_name, deadline).await;
            if let Err(e) = storage.update_snapshot(domain.id, &current).await {
                // The stale row stays behind; alerting still sees the fresh
                // snapshot this cycle.
                error!(
                    domain = %domain.domain_name,
                    error = %e,
                    "persisting snapshot failed"
                );
            }
            SweepResult { domain, current }
        }
    })
    .await
}

/// System-wide periodic sweep: runs once immediately, then on the configured
/// interval for the lifetime of the process. A failure to list domains
/// aborts that tick only; the next tick still fires on schedule.
#[tracing::instrument(skip_all)]
pub async fn run_periodic_sweeps<S: Storage + 'static>(
    storage: Arc<S>,
    engine: Arc<AlertEngine<S>>,
    cfg: PollConfig,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
    loop {
        ticker.tick().await;
        let domains = match storage.list_tracked_domains().await {
            Ok(domains) => domains,
            Err(e) => {
                error!(error = %e, "listing tracked domains failed, skipping this sweep");
                continue;
            }
        };

        info!(domains = domains.len(), "certificate sweep started");
        let results = sweep_domains(
            &storage,
            domains,
            cfg.sweep_concurrency,
            Duration::from_secs(cfg.sweep_timeout_secs),
        )
        .await;
        engine.process_batch(&results).await;
        info!(probed = results.len(), "certificate sweep finished");
    }
}

/// On-demand check of one user's tracked domains.
///
/// Gated by a per-user cooldown: a request within `cooldown_minutes` of the
/// previous completed check is rejected without probing. Only domains the
/// user is actually tracking are probed. Individual probe errors are not
/// surfaced here, only the aggregate count.
#[tracing::instrument(skip(storage, engine, cfg), fields(user_id = user_id))]
pub async fn check_user_domains<S: Storage + 'static>(
    storage: &Arc<S>,
    engine: &AlertEngine<S>,
    user_id: i64,
    cfg: &PollConfig,
) -> Result<OnDemandOutcome, DbErr> {
    let now = OffsetDateTime::now_utc();
    if let Some(last_check) = storage.user_cooldown(user_id).await?
        && now - last_check < time::Duration::minutes(cfg.cooldown_minutes)
    {
        info!("on-demand check rejected, cooldown active");
        return Ok(OnDemandOutcome::TooSoon);
    }

    let domains = storage.list_user_domains(user_id).await?;
    let results = sweep_domains(
        storage,
        domains,
        cfg.on_demand_concurrency,
        Duration::from_secs(cfg.on_demand_timeout_secs),
    )
    .await;
    engine.process_batch(&results).await;

    storage
        .set_user_cooldown(user_id, OffsetDateTime::now_utc())
        .await?;
    Ok(OnDemandOutcome::Completed {
        checked: results.len(),
    })
}
