use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::modules::announcements::error::ScheduleError;
use crate::modules::announcements::store::{Job, JobMap, JobStore};
use crate::modules::announcements::templates::TemplateStore;

/// Jobs due within this many seconds get their one pre-fire warning.
pub(crate) const WARNING_WINDOW_SECS: i64 = 300;

/// Fixed name-based routing for announcement destinations, resolved once at
/// scheduling time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChannelRoutes {
    pub(crate) announcement: u64,
    pub(crate) test_announcement: u64,
    pub(crate) schedule: u64,
    pub(crate) activity_check: u64,
}

impl ChannelRoutes {
    fn for_announcement(&self, name: &str, input_channel: u64) -> u64 {
        match name {
            "activity check" => self.activity_check,
            // a schedule announcement requested from the test channel stays there
            "schedule" if input_channel == self.test_announcement => self.test_announcement,
            "schedule" => self.schedule,
            _ => self.announcement,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScheduleRequest {
    pub(crate) name: String,
    pub(crate) fire_at: DateTime<Utc>,
    pub(crate) author: u64,
    pub(crate) input_channel: u64,
    pub(crate) substitutions: Option<HashMap<String, String>>,
}

#[derive(Debug)]
pub(crate) struct Scheduled {
    pub(crate) job: Job,
    pub(crate) fire_at: i64,
    pub(crate) pending: usize,
}

#[derive(Debug)]
pub(crate) struct Cancelled {
    pub(crate) fire_at: i64,
    pub(crate) jobs: Vec<Job>,
}

/// What the tick needs to send one warning notice.
#[derive(Debug)]
pub(crate) struct Warning {
    pub(crate) fire_at: i64,
    pub(crate) name: String,
    pub(crate) author: u64,
    pub(crate) input_channel: u64,
}

#[derive(Debug)]
pub(crate) struct Drained {
    pub(crate) fired: Vec<(i64, Job)>,
    pub(crate) pending: usize,
}

/// Owns the pending-announcement map. Every mutation happens under the one
/// lock and is flushed to the store before the lock is released, so the tick
/// and concurrent commands can never double-fire or lose a cancellation.
#[derive(Debug)]
pub(crate) struct Scheduler {
    jobs: Mutex<JobMap>,
    store: JobStore,
    templates: Arc<TemplateStore>,
    routes: ChannelRoutes,
    ticking: AtomicBool,
}

impl Scheduler {
    pub(crate) fn new(store: JobStore, templates: Arc<TemplateStore>, routes: ChannelRoutes) -> Self {
        let jobs = store.load();
        debug!(
            pending = jobs.values().map(Vec::len).sum::<usize>(),
            "loaded pending announcements"
        );

        Self {
            jobs: Mutex::new(jobs),
            store,
            templates,
            routes,
            ticking: AtomicBool::new(false),
        }
    }

    /// Only the first caller gets `true`, the tick task must never run twice.
    pub(crate) fn claim_ticker(&self) -> bool {
        !self.ticking.swap(true, Ordering::SeqCst)
    }

    pub(crate) async fn schedule(
        &self,
        req: ScheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<Scheduled, ScheduleError> {
        let name = req.name.trim().to_lowercase();
        if !self.templates.contains(&name) {
            return Err(ScheduleError::UnknownAnnouncement(req.name));
        }
        if req.fire_at <= now {
            return Err(ScheduleError::PastTime(req.fire_at.timestamp()));
        }

        let fire_at = req.fire_at.timestamp();
        let mut jobs = self.jobs.lock().await;
        // one job per exact-second slot: cancellation is keyed by time, so a
        // shared slot would make the jobs in it impossible to cancel apart
        if jobs.contains_key(&fire_at) {
            return Err(ScheduleError::SlotTaken(fire_at));
        }

        let job = Job {
            announce_channel: self.routes.for_announcement(&name, req.input_channel),
            name,
            input_channel: req.input_channel,
            author: req.author,
            substitutions: req.substitutions,
            warned: false,
        };
        jobs.entry(fire_at).or_default().push(job.clone());
        self.persist(&jobs);

        Ok(Scheduled {
            job,
            fire_at,
            pending: count(&jobs),
        })
    }

    /// Remove every job in the bucket at `fire_at`. Cancellation is by
    /// time-slot, not job identity, so the bucket goes as a whole.
    pub(crate) async fn cancel(&self, fire_at: DateTime<Utc>) -> Result<Cancelled, ScheduleError> {
        let ts = fire_at.timestamp();
        let mut jobs = self.jobs.lock().await;
        let removed = jobs.remove(&ts).ok_or(ScheduleError::NotFound(ts))?;
        self.persist(&jobs);

        Ok(Cancelled {
            fire_at: ts,
            jobs: removed,
        })
    }

    /// Snapshot of pending jobs, ascending by fire time.
    pub(crate) async fn list_pending(&self) -> Vec<(i64, Vec<Job>)> {
        self.jobs
            .lock()
            .await
            .iter()
            .map(|(ts, bucket)| (*ts, bucket.clone()))
            .collect()
    }

    pub(crate) async fn pending_count(&self) -> usize {
        count(&*self.jobs.lock().await)
    }

    /// Flip `warned` on every job inside the warning window and return what
    /// the tick needs to send the notices. Each job shows up here once.
    pub(crate) async fn take_due_warnings(&self, now: DateTime<Utc>) -> Vec<Warning> {
        let now = now.timestamp();
        let mut jobs = self.jobs.lock().await;

        let mut warnings = Vec::new();
        for (&fire_at, bucket) in jobs.iter_mut() {
            let remaining = fire_at - now;
            if remaining <= 0 || remaining > WARNING_WINDOW_SECS {
                continue;
            }
            for job in bucket.iter_mut().filter(|job| !job.warned) {
                job.warned = true;
                warnings.push(Warning {
                    fire_at,
                    name: job.name.clone(),
                    author: job.author,
                    input_channel: job.input_channel,
                });
            }
        }

        if !warnings.is_empty() {
            self.persist(&jobs);
        }
        warnings
    }

    /// Drain every bucket whose time has arrived, ascending. Once removed
    /// here a job is committed to fire, a later cancel can no longer reach it.
    pub(crate) async fn drain_due(&self, now: DateTime<Utc>) -> Drained {
        let now = now.timestamp();
        let mut jobs = self.jobs.lock().await;

        let due: Vec<i64> = jobs.range(..=now).map(|(&ts, _)| ts).collect();
        let mut fired = Vec::new();
        for ts in due {
            if let Some(bucket) = jobs.remove(&ts) {
                fired.extend(bucket.into_iter().map(|job| (ts, job)));
            }
        }

        if !fired.is_empty() {
            self.persist(&jobs);
        }

        Drained {
            fired,
            pending: count(&jobs),
        }
    }

    fn persist(&self, jobs: &JobMap) {
        // the in-memory map stays authoritative if the write fails
        if let Err(err) = self.store.save(jobs) {
            error!("couldn't persist pending announcements: {}", err);
        }
    }
}

fn count(jobs: &JobMap) -> usize {
    jobs.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::{Duration, TimeZone};

    use super::*;

    const ROUTES: ChannelRoutes = ChannelRoutes {
        announcement: 100,
        test_announcement: 200,
        schedule: 300,
        activity_check: 400,
    };

    const TEMPLATES: &str = "\
Voting Start
Voting is now open, go vote!
===
Wonder Pick 2
Congrats {USER1} ({PACK1}) and {USER2} ({PACK2})!
===
activity check
React below to stay in the server.
===
schedule
A new cycle begins.";

    fn scheduler(dir: &Path) -> Scheduler {
        Scheduler::new(
            JobStore::new(dir.join("delays.json")),
            Arc::new(TemplateStore::parse(TEMPLATES)),
            ROUTES,
        )
    }

    fn request(name: &str, fire_at: DateTime<Utc>) -> ScheduleRequest {
        ScheduleRequest {
            name: name.into(),
            fire_at,
            author: 7,
            input_channel: 42,
            substitutions: None,
        }
    }

    fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
    }

    fn test_now() -> DateTime<Utc> {
        at(2025, 3, 1, 0, 0, 0)
    }

    #[tokio::test]
    async fn schedules_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let fire_at = at(2025, 3, 15, 22, 0, 0);
        let scheduled = sched
            .schedule(request("Voting Start", fire_at), test_now())
            .await
            .unwrap();

        assert_eq!(scheduled.fire_at, fire_at.timestamp());
        assert_eq!(scheduled.pending, 1);
        assert_eq!(scheduled.job.name, "voting start");
        assert_eq!(scheduled.job.announce_channel, ROUTES.announcement);
        assert!(!scheduled.job.warned);

        let pending = sched.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, fire_at.timestamp());
        assert_eq!(pending[0].1, vec![scheduled.job]);
    }

    #[tokio::test]
    async fn listing_is_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let later = at(2025, 3, 20, 0, 0, 0);
        let earlier = at(2025, 3, 10, 0, 0, 0);
        sched.schedule(request("Voting Start", later), test_now()).await.unwrap();
        sched.schedule(request("Voting Start", earlier), test_now()).await.unwrap();

        let order: Vec<i64> = sched.list_pending().await.iter().map(|(ts, _)| *ts).collect();
        assert_eq!(order, vec![earlier.timestamp(), later.timestamp()]);
    }

    #[tokio::test]
    async fn rejects_unknown_announcement() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let err = sched
            .schedule(request("No Such Thing", at(2025, 3, 15, 22, 0, 0)), test_now())
            .await
            .unwrap_err();

        assert_eq!(err, ScheduleError::UnknownAnnouncement("No Such Thing".into()));
        assert!(sched.list_pending().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_past_time() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let past = test_now() - Duration::minutes(1);
        let err = sched.schedule(request("Voting Start", past), test_now()).await.unwrap_err();
        assert_eq!(err, ScheduleError::PastTime(past.timestamp()));

        // "now" itself is not strictly in the future either
        let err = sched.schedule(request("Voting Start", test_now()), test_now()).await.unwrap_err();
        assert_eq!(err, ScheduleError::PastTime(test_now().timestamp()));

        assert!(sched.list_pending().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_exact_second_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let fire_at = at(2025, 3, 15, 22, 0, 0);
        sched.schedule(request("Voting Start", fire_at), test_now()).await.unwrap();

        let err = sched
            .schedule(request("activity check", fire_at), test_now())
            .await
            .unwrap_err();
        assert_eq!(err, ScheduleError::SlotTaken(fire_at.timestamp()));
        assert_eq!(sched.pending_count().await, 1);
    }

    #[tokio::test]
    async fn cancel_removes_exactly_one_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let first = at(2025, 3, 15, 22, 0, 0);
        let second = at(2025, 3, 16, 22, 0, 0);
        sched.schedule(request("Voting Start", first), test_now()).await.unwrap();
        sched.schedule(request("activity check", second), test_now()).await.unwrap();

        let cancelled = sched.cancel(first).await.unwrap();
        assert_eq!(cancelled.fire_at, first.timestamp());
        assert_eq!(cancelled.jobs.len(), 1);
        assert_eq!(cancelled.jobs[0].name, "voting start");

        let pending = sched.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, second.timestamp());

        // the bucket is gone, a second cancel finds nothing
        let err = sched.cancel(first).await.unwrap_err();
        assert_eq!(err, ScheduleError::NotFound(first.timestamp()));
    }

    #[tokio::test]
    async fn warns_exactly_once_and_keeps_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let fire_at = at(2025, 3, 15, 22, 0, 0);
        sched.schedule(request("Voting Start", fire_at), test_now()).await.unwrap();

        // 200 seconds before the fire time, inside the 5-minute window
        let tick_now = fire_at - Duration::seconds(200);
        let warnings = sched.take_due_warnings(tick_now).await;
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].fire_at, fire_at.timestamp());
        assert_eq!(warnings[0].input_channel, 42);

        // the job stays pending, and repeat ticks don't warn again
        assert_eq!(sched.pending_count().await, 1);
        assert!(sched.take_due_warnings(tick_now).await.is_empty());
        assert!(sched
            .take_due_warnings(tick_now + Duration::seconds(60))
            .await
            .is_empty());
        assert!(sched.list_pending().await[0].1[0].warned);
    }

    #[tokio::test]
    async fn does_not_warn_outside_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let fire_at = at(2025, 3, 15, 22, 0, 0);
        sched.schedule(request("Voting Start", fire_at), test_now()).await.unwrap();

        // too early, and already due are both excluded
        assert!(sched
            .take_due_warnings(fire_at - Duration::seconds(301))
            .await
            .is_empty());
        assert!(sched.take_due_warnings(fire_at).await.is_empty());
    }

    #[tokio::test]
    async fn drains_due_buckets_and_reports_post_removal_count() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let due = at(2025, 3, 15, 22, 0, 0);
        let future = at(2025, 3, 20, 22, 0, 0);
        sched.schedule(request("Voting Start", due), test_now()).await.unwrap();
        sched.schedule(request("activity check", future), test_now()).await.unwrap();

        // five seconds past the fire time
        let drained = sched.drain_due(due + Duration::seconds(5)).await;
        assert_eq!(drained.fired.len(), 1);
        assert_eq!(drained.fired[0].0, due.timestamp());
        assert_eq!(drained.fired[0].1.name, "voting start");
        assert_eq!(drained.pending, 1);

        // the fired job is gone for good
        assert!(sched.drain_due(due + Duration::seconds(65)).await.fired.is_empty());
        assert_eq!(sched.cancel(due).await.unwrap_err(), ScheduleError::NotFound(due.timestamp()));
    }

    #[tokio::test]
    async fn drains_multiple_due_buckets_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let first = at(2025, 3, 15, 22, 0, 0);
        let second = at(2025, 3, 15, 22, 1, 0);
        sched.schedule(request("Voting Start", second), test_now()).await.unwrap();
        sched.schedule(request("activity check", first), test_now()).await.unwrap();

        let drained = sched.drain_due(second + Duration::seconds(1)).await;
        let order: Vec<i64> = drained.fired.iter().map(|(ts, _)| *ts).collect();
        assert_eq!(order, vec![first.timestamp(), second.timestamp()]);
        assert_eq!(drained.pending, 0);
    }

    #[tokio::test]
    async fn routes_by_announcement_name() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        let base = at(2025, 3, 15, 22, 0, 0);
        let activity = sched
            .schedule(request("Activity Check", base), test_now())
            .await
            .unwrap();
        assert_eq!(activity.job.announce_channel, ROUTES.activity_check);

        let schedule = sched
            .schedule(request("schedule", base + Duration::minutes(1)), test_now())
            .await
            .unwrap();
        assert_eq!(schedule.job.announce_channel, ROUTES.schedule);

        // requested from the test channel, the schedule announcement stays there
        let mut req = request("schedule", base + Duration::minutes(2));
        req.input_channel = ROUTES.test_announcement;
        let test_schedule = sched.schedule(req, test_now()).await.unwrap();
        assert_eq!(test_schedule.job.announce_channel, ROUTES.test_announcement);
    }

    #[tokio::test]
    async fn pending_jobs_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();

        let fire_at = at(2025, 3, 15, 22, 0, 0);
        {
            let sched = scheduler(dir.path());
            sched.schedule(request("Voting Start", fire_at), test_now()).await.unwrap();
        }

        let reloaded = scheduler(dir.path());
        let pending = reloaded.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, fire_at.timestamp());
        assert_eq!(pending[0].1[0].name, "voting start");
    }

    #[tokio::test]
    async fn ticker_is_claimed_once() {
        let dir = tempfile::tempdir().unwrap();
        let sched = scheduler(dir.path());

        assert!(sched.claim_ticker());
        assert!(!sched.claim_ticker());
    }
}
