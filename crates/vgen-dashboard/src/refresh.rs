//! Collection refresher.
//!
//! Re-fetches the whole idea collection on a fixed cadence and whenever a
//! refresh is requested through a [`RefreshHandle`]. Each fetch fully
//! replaces the collection, then the queue observer is reconciled against it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use vgen_client::StudioApi;

use crate::collection::{IdeaCollection, RefreshReport};
use crate::error::DashboardResult;
use crate::metrics::record_refresh;
use crate::observer::QueueObserver;

/// Asks the refresher for an out-of-cycle re-fetch.
///
/// Requests coalesce: several calls before the refresher wakes up trigger a
/// single fetch.
#[derive(Debug, Clone, Default)]
pub struct RefreshHandle {
    notify: Arc<Notify>,
}

impl RefreshHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.notify.notify_one();
    }

    /// Resolves once a refresh has been requested.
    pub async fn requested(&self) {
        self.notify.notified().await;
    }
}

pub struct CollectionRefresher {
    api: Arc<dyn StudioApi>,
    collection: Arc<RwLock<IdeaCollection>>,
    observer: QueueObserver,
    refresh_interval: Duration,
    handle: RefreshHandle,
    /// Held from fetch to replace so refreshes apply in fetch order
    in_flight: Mutex<()>,
}

impl CollectionRefresher {
    pub fn new(
        api: Arc<dyn StudioApi>,
        collection: Arc<RwLock<IdeaCollection>>,
        observer: QueueObserver,
        refresh_interval: Duration,
        handle: RefreshHandle,
    ) -> Self {
        Self {
            api,
            collection,
            observer,
            refresh_interval,
            handle,
            in_flight: Mutex::new(()),
        }
    }

    pub fn handle(&self) -> RefreshHandle {
        self.handle.clone()
    }

    /// Fetch, replace, reconcile the observer.
    ///
    /// On failure the previous collection stays in place. Concurrent calls
    /// (a manual refresh overlapping the loop) run one after the other, so
    /// the observer and the collection always see the same, latest list.
    pub async fn refresh_once(&self) -> DashboardResult<RefreshReport> {
        let _serial = self.in_flight.lock().await;

        let ideas = match self.api.list_ideas().await {
            Ok(ideas) => ideas,
            Err(e) => {
                record_refresh(false);
                return Err(e.into());
            }
        };

        self.observer.sync(&ideas);

        let report = {
            let mut collection = self.collection.write().await;
            collection.replace_all(ideas)
        };

        record_refresh(true);
        debug!(
            total = report.total,
            pruned = report.pruned.len(),
            violations = report.violations.len(),
            "Collection refreshed"
        );
        Ok(report)
    }

    /// Refresh loop. Runs until the task is aborted.
    pub async fn run(&self) {
        info!("Starting collection refresher (interval: {:?})", self.refresh_interval);

        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.handle.requested() => {
                    debug!("Refresh requested");
                    ticker.reset();
                }
            }

            if let Err(e) = self.refresh_once().await {
                warn!("Collection refresh failed, keeping previous state: {}", e.user_message());
            }
        }
    }
}
