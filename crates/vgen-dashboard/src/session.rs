//! Dashboard session: one collection, one observer, one refresher and the
//! controller that acts on them, all sharing a single backend client.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use vgen_client::StudioApi;
use vgen_models::{status_display, Idea, IdeaId, JobQueueStatus, QueueStats, Script, StatusDisplay, Video};

use crate::collection::{IdeaCollection, RefreshReport, StatusCounts};
use crate::config::DashboardConfig;
use crate::controller::{actions_for, IdeaAction, PipelineController};
use crate::error::DashboardResult;
use crate::observer::QueueObserver;
use crate::refresh::{CollectionRefresher, RefreshHandle};

/// Everything a card needs to render one idea.
#[derive(Debug, Clone, Serialize)]
pub struct IdeaView {
    pub idea: Idea,
    pub display: StatusDisplay,
    pub queue_position: Option<u32>,
    pub actions: Vec<IdeaAction>,
    pub selected: bool,
}

pub struct DashboardSession {
    api: Arc<dyn StudioApi>,
    collection: Arc<RwLock<IdeaCollection>>,
    observer: QueueObserver,
    refresher: Arc<CollectionRefresher>,
    controller: PipelineController,
    refresh_task: Option<JoinHandle<()>>,
}

impl DashboardSession {
    pub fn new(api: Arc<dyn StudioApi>, config: &DashboardConfig) -> Self {
        let collection = Arc::new(RwLock::new(IdeaCollection::new()));
        let observer = QueueObserver::new(Arc::clone(&api), config.queue_poll_interval);
        let handle = RefreshHandle::new();

        let refresher = Arc::new(CollectionRefresher::new(
            Arc::clone(&api),
            Arc::clone(&collection),
            observer.clone(),
            config.refresh_interval,
            handle.clone(),
        ));
        let controller = PipelineController::new(
            Arc::clone(&api),
            Arc::clone(&collection),
            handle,
            config.bulk_delay,
        );

        Self {
            api,
            collection,
            observer,
            refresher,
            controller,
            refresh_task: None,
        }
    }

    pub fn controller(&self) -> &PipelineController {
        &self.controller
    }

    pub fn observer(&self) -> &QueueObserver {
        &self.observer
    }

    pub fn collection(&self) -> Arc<RwLock<IdeaCollection>> {
        Arc::clone(&self.collection)
    }

    /// Re-fetch now, outside the refresh loop.
    pub async fn refresh(&self) -> DashboardResult<RefreshReport> {
        self.refresher.refresh_once().await
    }

    /// Spawn the periodic refresh loop. Calling it twice is a no-op.
    pub fn start(&mut self) {
        if self.refresh_task.is_some() {
            return;
        }
        let refresher = Arc::clone(&self.refresher);
        self.refresh_task = Some(tokio::spawn(async move { refresher.run().await }));
    }

    /// Current idea from the collection, falling back to the backend.
    pub async fn idea(&self, idea_id: &IdeaId) -> DashboardResult<Idea> {
        if let Some(idea) = self.collection.read().await.get(idea_id).cloned() {
            return Ok(idea);
        }
        Ok(self.api.get_idea(idea_id).await?)
    }

    pub async fn queue_stats(&self) -> DashboardResult<QueueStats> {
        Ok(self.api.queue_stats().await?)
    }

    /// One-off job-status fetch, independent of the observer.
    pub async fn job_status(&self, idea_id: &IdeaId) -> DashboardResult<JobQueueStatus> {
        Ok(self.api.job_status(idea_id).await?)
    }

    /// Script of an idea, `None` until script generation produced one.
    pub async fn script(&self, idea_id: &IdeaId) -> DashboardResult<Option<Script>> {
        match self.api.script_by_idea(idea_id).await {
            Ok(script) => Ok(Some(script)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn videos(&self) -> DashboardResult<Vec<Video>> {
        Ok(self.api.list_videos().await?)
    }

    pub async fn status_counts(&self) -> StatusCounts {
        self.collection.read().await.status_counts()
    }

    /// Cards for the filtered view, in collection order.
    pub async fn view(&self) -> Vec<IdeaView> {
        let collection = self.collection.read().await;
        collection
            .visible()
            .into_iter()
            .map(|idea| IdeaView {
                display: status_display(idea.status),
                queue_position: self.observer.queue_position(&idea.id),
                actions: actions_for(idea),
                selected: collection.is_selected(&idea.id),
                idea: idea.clone(),
            })
            .collect()
    }

    /// Stop the refresh loop and every poller.
    pub async fn shutdown(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
            let _ = task.await;
        }
        self.observer.shutdown();
        info!("Dashboard session closed");
    }
}
