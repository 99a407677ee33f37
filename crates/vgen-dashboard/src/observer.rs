//! Queue observer.
//!
//! One scheduler keyed by idea id. Every idea whose status is poll-eligible
//! gets a poller task fetching its job-queue status on a fixed cadence; the
//! task is aborted as soon as the idea leaves the eligible set or disappears.
//!
//! The observer never touches an idea's `status`. It only keeps the latest
//! [`JobQueueStatus`] snapshot for display.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use vgen_client::{ClientResult, StudioApi};
use vgen_models::{Idea, IdeaId, IdeaStatus, JobQueueStatus};

use crate::metrics::{record_poll, set_tracked_ideas, PollOutcome};

struct Tracked {
    /// Bumped every time a poller is (re)started for this id
    epoch: u64,
    status: IdeaStatus,
    handle: JoinHandle<()>,
    snapshot: Option<JobQueueStatus>,
}

struct ObserverInner {
    api: Arc<dyn StudioApi>,
    poll_interval: Duration,
    tracked: Mutex<HashMap<IdeaId, Tracked>>,
    next_epoch: AtomicU64,
}

impl ObserverInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<IdeaId, Tracked>> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge a poll result, unless the poller that issued it was stopped.
    fn apply(&self, idea_id: &IdeaId, epoch: u64, result: ClientResult<JobQueueStatus>) -> PollOutcome {
        let mut tracked = self.lock();
        let entry = match tracked.get_mut(idea_id) {
            Some(entry) if entry.epoch == epoch => entry,
            _ => {
                debug!(idea_id = %idea_id, epoch, "Discarding poll result from stopped poller");
                return PollOutcome::Discarded;
            }
        };

        match result {
            Ok(snapshot) => {
                entry.snapshot = Some(snapshot);
                PollOutcome::Ok
            }
            Err(e) if e.is_not_found() => {
                debug!(idea_id = %idea_id, "Job status not found, idea likely deleted");
                PollOutcome::NotFound
            }
            Err(e) => {
                warn!(idea_id = %idea_id, "Job status poll failed, keeping last value: {}", e);
                PollOutcome::Error
            }
        }
    }
}

impl Drop for ObserverInner {
    fn drop(&mut self) {
        let tracked = self.tracked.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, entry) in tracked.drain() {
            entry.handle.abort();
        }
    }
}

/// Polls job-queue status for every idea the backend is working on.
#[derive(Clone)]
pub struct QueueObserver {
    inner: Arc<ObserverInner>,
}

impl QueueObserver {
    pub fn new(api: Arc<dyn StudioApi>, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(ObserverInner {
                api,
                poll_interval,
                tracked: Mutex::new(HashMap::new()),
                next_epoch: AtomicU64::new(1),
            }),
        }
    }

    /// Reconcile pollers with a fresh collection.
    ///
    /// Starts a poller for each newly eligible idea, keeps existing pollers
    /// running when the status moves within the eligible set, and stops
    /// pollers for ideas that left the set or vanished.
    pub fn sync(&self, ideas: &[Idea]) {
        let eligible: HashMap<&IdeaId, IdeaStatus> = ideas
            .iter()
            .filter(|idea| idea.status.is_poll_eligible())
            .map(|idea| (&idea.id, idea.status))
            .collect();

        let mut tracked = self.inner.lock();

        tracked.retain(|idea_id, entry| {
            if eligible.contains_key(idea_id) {
                return true;
            }
            entry.handle.abort();
            debug!(idea_id = %idea_id, "Stopped queue poller");
            false
        });

        for (idea_id, status) in eligible {
            match tracked.get_mut(idea_id) {
                Some(entry) => {
                    if entry.status != status {
                        debug!(idea_id = %idea_id, from = %entry.status, to = %status, "Poller continues");
                        entry.status = status;
                    }
                }
                None => {
                    let entry = self.spawn_poller(idea_id.clone(), status);
                    tracked.insert(idea_id.clone(), entry);
                }
            }
        }

        set_tracked_ideas(tracked.len());
    }

    /// Start polling a single idea if it is eligible; stop it otherwise.
    pub fn track(&self, idea_id: &IdeaId, status: IdeaStatus) {
        if !status.is_poll_eligible() {
            self.untrack(idea_id);
            return;
        }

        let mut tracked = self.inner.lock();
        match tracked.get_mut(idea_id) {
            Some(entry) => entry.status = status,
            None => {
                let entry = self.spawn_poller(idea_id.clone(), status);
                tracked.insert(idea_id.clone(), entry);
            }
        }
        set_tracked_ideas(tracked.len());
    }

    /// Stop polling an idea. A result already in flight is discarded.
    pub fn untrack(&self, idea_id: &IdeaId) {
        let mut tracked = self.inner.lock();
        if let Some(entry) = tracked.remove(idea_id) {
            entry.handle.abort();
            debug!(idea_id = %idea_id, "Stopped queue poller");
        }
        set_tracked_ideas(tracked.len());
    }

    pub fn is_tracking(&self, idea_id: &IdeaId) -> bool {
        self.inner.lock().contains_key(idea_id)
    }

    /// Ids currently polled, sorted.
    pub fn tracked_ids(&self) -> Vec<IdeaId> {
        let mut ids: Vec<IdeaId> = self.inner.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Last job-queue snapshot for an idea, if any poll succeeded.
    pub fn snapshot(&self, idea_id: &IdeaId) -> Option<JobQueueStatus> {
        self.inner
            .lock()
            .get(idea_id)
            .and_then(|entry| entry.snapshot.clone())
    }

    /// 1-based queue position while the job waits.
    pub fn queue_position(&self, idea_id: &IdeaId) -> Option<u32> {
        self.inner
            .lock()
            .get(idea_id)
            .and_then(|entry| entry.snapshot.as_ref())
            .and_then(|snapshot| snapshot.queue_position)
    }

    /// Stop every poller.
    pub fn shutdown(&self) {
        let mut tracked = self.inner.lock();
        let count = tracked.len();
        for (_, entry) in tracked.drain() {
            entry.handle.abort();
        }
        set_tracked_ideas(0);
        info!(count, "Queue observer stopped");
    }

    fn spawn_poller(&self, idea_id: IdeaId, status: IdeaStatus) -> Tracked {
        let epoch = self.inner.next_epoch.fetch_add(1, Ordering::Relaxed);
        let weak = Arc::downgrade(&self.inner);
        let poll_interval = self.inner.poll_interval;

        debug!(idea_id = %idea_id, status = %status, epoch, "Starting queue poller");

        let handle = tokio::spawn(poll_loop(weak, idea_id, epoch, poll_interval));

        Tracked {
            epoch,
            status,
            handle,
            snapshot: None,
        }
    }
}

async fn poll_loop(inner: Weak<ObserverInner>, idea_id: IdeaId, epoch: u64, poll_interval: Duration) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(observer) = inner.upgrade() else {
            return;
        };
        let api = Arc::clone(&observer.api);
        drop(observer);

        let result = api.job_status(&idea_id).await;

        let Some(observer) = inner.upgrade() else {
            return;
        };
        let outcome = observer.apply(&idea_id, epoch, result);
        record_poll(outcome);

        if outcome == PollOutcome::Discarded {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use vgen_client::ClientError;
    use vgen_models::{
        BatchAction, BatchOutcome, CancelJobResponse, CustomScriptRequest, GenerateIdeasRequest,
        GeneratedIdeas, JobStatus, PipelineStatus, QueueStats, Script, Stage, StartPipelineResponse,
        UploadVideoRequest, UploadVideoResponse, ValidateIdeaRequest, Video,
    };

    const POLL: Duration = Duration::from_secs(5);

    /// Answers job-status polls and counts them per id.
    #[derive(Default)]
    struct PollCounter {
        calls: Mutex<HashMap<IdeaId, usize>>,
        total: AtomicUsize,
        missing: Mutex<Vec<IdeaId>>,
    }

    impl PollCounter {
        fn calls(&self, id: &str) -> usize {
            self.calls.lock().unwrap().get(&IdeaId::from(id)).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl StudioApi for PollCounter {
        async fn job_status(&self, idea_id: &IdeaId) -> ClientResult<JobQueueStatus> {
            *self.calls.lock().unwrap().entry(idea_id.clone()).or_default() += 1;
            let n = self.total.fetch_add(1, Ordering::SeqCst) as u32;
            if self.missing.lock().unwrap().contains(idea_id) {
                return Err(ClientError::from_http_status(404, r#"{"detail": "Idea not found"}"#));
            }
            let mut status = JobQueueStatus::no_job(idea_id.clone());
            status.has_job = true;
            status.status = Some(JobStatus::Queued);
            status.queue_position = Some(n + 1);
            Ok(status)
        }

        async fn list_ideas(&self) -> ClientResult<Vec<Idea>> {
            unimplemented!()
        }
        async fn get_idea(&self, _: &IdeaId) -> ClientResult<Idea> {
            unimplemented!()
        }
        async fn generate_ideas(&self, _: &GenerateIdeasRequest) -> ClientResult<GeneratedIdeas> {
            unimplemented!()
        }
        async fn create_from_script(&self, _: &CustomScriptRequest) -> ClientResult<GeneratedIdeas> {
            unimplemented!()
        }
        async fn validate_idea(&self, _: &IdeaId, _: &ValidateIdeaRequest) -> ClientResult<Idea> {
            unimplemented!()
        }
        async fn reject_idea(&self, _: &IdeaId) -> ClientResult<()> {
            unimplemented!()
        }
        async fn delete_idea(&self, _: &IdeaId) -> ClientResult<()> {
            unimplemented!()
        }
        async fn batch_action(&self, _: &[IdeaId], _: BatchAction) -> ClientResult<BatchOutcome> {
            unimplemented!()
        }
        async fn start_pipeline(&self, _: &IdeaId, _: Stage) -> ClientResult<StartPipelineResponse> {
            unimplemented!()
        }
        async fn pipeline_status(&self, _: &IdeaId) -> ClientResult<PipelineStatus> {
            unimplemented!()
        }
        async fn queue_stats(&self) -> ClientResult<QueueStats> {
            unimplemented!()
        }
        async fn cancel_job(&self, _: &IdeaId) -> ClientResult<CancelJobResponse> {
            unimplemented!()
        }
        async fn script_by_idea(&self, _: &IdeaId) -> ClientResult<Script> {
            unimplemented!()
        }
        async fn list_videos(&self) -> ClientResult<Vec<Video>> {
            unimplemented!()
        }
        async fn video_by_idea(&self, _: &IdeaId) -> ClientResult<Video> {
            unimplemented!()
        }
        async fn upload_video(&self, _: &Video, _: &UploadVideoRequest) -> ClientResult<UploadVideoResponse> {
            unimplemented!()
        }
    }

    fn setup() -> (Arc<PollCounter>, QueueObserver) {
        let api = Arc::new(PollCounter::default());
        let observer = QueueObserver::new(api.clone(), POLL);
        (api, observer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_only_eligible_statuses() {
        let (api, observer) = setup();
        let ideas: Vec<Idea> = IdeaStatus::ALL
            .iter()
            .map(|status| Idea::new(status.as_str(), status.as_str(), *status))
            .collect();

        observer.sync(&ideas);
        tokio::time::sleep(POLL * 2 + Duration::from_secs(1)).await;

        for status in IdeaStatus::ALL {
            let polled = api.calls(status.as_str()) > 0;
            assert_eq!(polled, status.is_poll_eligible(), "status {status}");
        }
        assert_eq!(observer.tracked_ids().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_within_one_tick_of_leaving_the_set() {
        let (api, observer) = setup();
        let mut idea = Idea::new("a", "A", IdeaStatus::AudioGenerating);

        observer.sync(std::slice::from_ref(&idea));
        tokio::time::sleep(POLL + Duration::from_secs(1)).await;
        assert_eq!(api.calls("a"), 2);

        idea.status = IdeaStatus::AudioGenerated;
        observer.sync(std::slice::from_ref(&idea));
        assert!(!observer.is_tracking(&idea.id));

        tokio::time::sleep(POLL * 4).await;
        assert_eq!(api.calls("a"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_moving_within_the_set_keeps_polling() {
        let (api, observer) = setup();
        let mut idea = Idea::new("a", "A", IdeaStatus::Queued);

        observer.sync(std::slice::from_ref(&idea));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.calls("a"), 1);

        idea.status = IdeaStatus::ScriptGenerating;
        observer.sync(std::slice::from_ref(&idea));

        // The original cadence continues: next poll at 5s, not 1s + 5s.
        tokio::time::sleep(Duration::from_secs(4) + Duration::from_millis(100)).await;
        assert_eq!(api.calls("a"), 2);
        assert!(observer.is_tracking(&idea.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_vanished_idea_is_untracked() {
        let (api, observer) = setup();
        observer.sync(&[Idea::new("a", "A", IdeaStatus::Processing)]);
        tokio::time::sleep(Duration::from_secs(1)).await;

        observer.sync(&[]);
        tokio::time::sleep(POLL * 3).await;
        assert_eq!(api.calls("a"), 1);
        assert!(observer.tracked_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_position_exposed() {
        let (_api, observer) = setup();
        let id = IdeaId::from("a");
        observer.track(&id, IdeaStatus::Queued);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(observer.queue_position(&id), Some(1));
        assert!(observer.snapshot(&id).is_some_and(|s| s.is_cancellable()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_keeps_polling_quietly() {
        let (api, observer) = setup();
        api.missing.lock().unwrap().push(IdeaId::from("gone"));
        observer.track(&IdeaId::from("gone"), IdeaStatus::Queued);

        tokio::time::sleep(POLL + Duration::from_secs(1)).await;
        assert_eq!(api.calls("gone"), 2);
        assert_eq!(observer.queue_position(&IdeaId::from("gone")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_epoch_is_discarded() {
        let (_api, observer) = setup();
        let id = IdeaId::from("a");
        observer.track(&id, IdeaStatus::Queued);
        let stale_epoch = observer.inner.lock().get(&id).map(|e| e.epoch).unwrap();

        observer.untrack(&id);
        observer.track(&id, IdeaStatus::Queued);

        let mut late = JobQueueStatus::no_job(id.clone());
        late.queue_position = Some(99);
        let outcome = observer.inner.apply(&id, stale_epoch, Ok(late));

        assert_eq!(outcome, PollOutcome::Discarded);
        assert_ne!(observer.queue_position(&id), Some(99));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_everything() {
        let (api, observer) = setup();
        observer.sync(&[
            Idea::new("a", "A", IdeaStatus::Queued),
            Idea::new("b", "B", IdeaStatus::VideoGenerating),
        ]);
        tokio::time::sleep(Duration::from_secs(1)).await;
        observer.shutdown();

        tokio::time::sleep(POLL * 3).await;
        assert_eq!(api.calls("a") + api.calls("b"), 2);
        assert!(observer.tracked_ids().is_empty());
    }
}
