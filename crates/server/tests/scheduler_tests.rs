//! Tests for the bounded sweep primitive and the on-demand check path.

mod common;

use certalert::alerts::AlertEngine;
use certalert::config::PollConfig;
use certalert::notify::Dispatcher;
use certalert::scheduler::{OnDemandOutcome, bounded_sweep, check_user_domains};
use common::{MemoryStorage, tracked};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::{Duration, OffsetDateTime};

fn engine(storage: &Arc<MemoryStorage>) -> AlertEngine<MemoryStorage> {
    AlertEngine::new(
        storage.clone(),
        Dispatcher::new(Vec::new()),
        "https://certalert.example".to_string(),
    )
}

// =============================================================================
// Bounded sweep primitive
// =============================================================================

#[tokio::test]
async fn sweep_never_exceeds_the_concurrency_limit() {
    let active = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let items: Vec<usize> = (0..200).collect();
    let active_in = active.clone();
    let max_in = max_seen.clone();
    let results = bounded_sweep(items, 50, move |i: usize| {
        let active = active_in.clone();
        let max_seen = max_in.clone();
        async move {
            let now_active = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_seen.fetch_max(now_active, Ordering::SeqCst);
            tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
            active.fetch_sub(1, Ordering::SeqCst);
            i
        }
    })
    .await;

    assert_eq!(results.len(), 200);
    assert!(
        max_seen.load(Ordering::SeqCst) <= 50,
        "observed {} concurrent tasks",
        max_seen.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn sweep_is_a_barrier() {
    let active = Arc::new(AtomicUsize::new(0));
    let active_in = active.clone();

    let results = bounded_sweep((0..40).collect::<Vec<i32>>(), 8, move |i: i32| {
        let active = active_in.clone();
        async move {
            active.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(tokio::time::Duration::from_millis(3)).await;
            active.fetch_sub(1, Ordering::SeqCst);
            i * 2
        }
    })
    .await;

    // Every task has finished by the time the call returns.
    assert_eq!(active.load(Ordering::SeqCst), 0);
    assert_eq!(results.len(), 40);
}

#[tokio::test]
async fn one_panicking_task_does_not_abort_the_sweep() {
    let results = bounded_sweep((0..10).collect::<Vec<i32>>(), 4, |i: i32| async move {
        if i == 3 {
            panic!("probe task blew up");
        }
        i
    })
    .await;

    assert_eq!(results.len(), 9);
    assert!(!results.contains(&3));
}

// =============================================================================
// On-demand check: cooldown gating
// =============================================================================

#[tokio::test]
async fn on_demand_check_rejected_ten_minutes_after_previous() {
    let storage = Arc::new(MemoryStorage::default());
    storage.cooldowns.lock().unwrap().insert(
        7,
        OffsetDateTime::now_utc() - Duration::minutes(10),
    );
    let engine = engine(&storage);

    let outcome = check_user_domains(&storage, &engine, 7, &PollConfig::default())
        .await
        .unwrap();
    assert_eq!(outcome, OnDemandOutcome::TooSoon);
    // nothing was probed or persisted
    assert!(storage.snapshot_updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn on_demand_check_accepted_thirty_one_minutes_after_previous() {
    let storage = Arc::new(MemoryStorage::default());
    let stale = OffsetDateTime::now_utc() - Duration::minutes(31);
    storage.cooldowns.lock().unwrap().insert(7, stale);
    let engine = engine(&storage);

    let outcome = check_user_domains(&storage, &engine, 7, &PollConfig::default())
        .await
        .unwrap();
    assert_eq!(outcome, OnDemandOutcome::Completed { checked: 0 });

    // cooldown moved forward to completion time
    let updated = storage.cooldowns.lock().unwrap()[&7];
    assert!(updated > stale);
}

#[tokio::test]
async fn on_demand_check_allowed_for_user_without_prior_check() {
    let storage = Arc::new(MemoryStorage::default());
    let engine = engine(&storage);

    let outcome = check_user_domains(&storage, &engine, 1, &PollConfig::default())
        .await
        .unwrap();
    assert_eq!(outcome, OnDemandOutcome::Completed { checked: 0 });
    assert!(storage.cooldowns.lock().unwrap().contains_key(&1));
}

// =============================================================================
// On-demand check: probes exactly the user's tracked domains
// =============================================================================

#[tokio::test]
async fn on_demand_check_probes_only_the_requesting_users_domains() {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let storage = Arc::new(MemoryStorage::default());
    {
        let mut domains = storage.domains.lock().unwrap();
        // 127.0.0.1 has nothing listening on 443, so probes fail fast as
        // offline; what matters here is which rows get probed at all.
        domains.push(tracked(1, 7, "127.0.0.1", None));
        domains.push(tracked(2, 8, "127.0.0.1", None));
    }
    let engine = engine(&storage);

    let cfg = PollConfig {
        on_demand_timeout_secs: 2,
        ..PollConfig::default()
    };
    let outcome = check_user_domains(&storage, &engine, 7, &cfg).await.unwrap();
    assert_eq!(outcome, OnDemandOutcome::Completed { checked: 1 });

    let updates = storage.snapshot_updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, 1, "only user 7's row may be probed");
}
