//! Tokio-native job scheduler.
//!
//! One background task owns a binary heap of pending jobs and waits on
//! whichever comes first: a command (schedule/cancel) or the earliest
//! deadline. One-shot jobs fire once; daily jobs re-arm for the next IST
//! wall-clock occurrence after each run. Jobs run in their own spawned
//! tasks so a slow job never delays dispatch.
//!
//! Re-scheduling an existing id replaces the pending entry; a cancelled id
//! never fires. Deadlines already in the past fire immediately, which is
//! what restores reminders that came due while the service was down.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use futures_util::future::BoxFuture;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Boxed async job body
pub type JobFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure into a [`JobFn`]
pub fn job_fn<F, Fut>(f: F) -> JobFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as BoxFuture<'static, ()>)
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Scheduler is shut down")]
    ShutDown,
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

#[derive(Clone, Copy)]
enum Kind {
    OneShot,
    Daily { hour: u32, minute: u32 },
}

enum Command {
    Schedule {
        id: String,
        run_at: DateTime<Utc>,
        kind: Kind,
        job: JobFn,
    },
    Cancel {
        id: String,
    },
}

struct Entry {
    run_at: DateTime<Utc>,
    /// Monotonic sequence; a popped entry whose seq is stale was replaced
    seq: u64,
    id: String,
    kind: Kind,
    job: JobFn,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at && self.seq == other.seq
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest deadline wins
        other
            .run_at
            .cmp(&self.run_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Handle to the scheduler task
#[derive(Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Command>,
    job_count: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    /// Spawn the scheduler loop on the current runtime
    #[must_use]
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let job_count = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicBool::new(true));

        tokio::spawn(run_loop(rx, Arc::clone(&job_count), Arc::clone(&running)));

        Self {
            tx,
            job_count,
            running,
        }
    }

    /// Schedule a one-shot job at an absolute instant.
    ///
    /// An existing job with the same id is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error when the scheduler task has shut down.
    pub fn schedule_at<Tz: TimeZone>(
        &self,
        id: impl Into<String>,
        run_at: DateTime<Tz>,
        job: JobFn,
    ) -> Result<(), SchedulerError> {
        self.tx
            .send(Command::Schedule {
                id: id.into(),
                run_at: run_at.with_timezone(&Utc),
                kind: Kind::OneShot,
                job,
            })
            .map_err(|_| SchedulerError::ShutDown)
    }

    /// Schedule a daily job at the given IST wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid time or a shut-down scheduler.
    pub fn schedule_daily(
        &self,
        id: impl Into<String>,
        hour: u32,
        minute: u32,
        job: JobFn,
    ) -> Result<(), SchedulerError> {
        if hour > 23 || minute > 59 {
            return Err(SchedulerError::InvalidSchedule(format!(
                "{hour:02}:{minute:02} is not a valid time"
            )));
        }
        let run_at = next_daily_occurrence(hour, minute, Utc::now());
        self.tx
            .send(Command::Schedule {
                id: id.into(),
                run_at,
                kind: Kind::Daily { hour, minute },
                job,
            })
            .map_err(|_| SchedulerError::ShutDown)
    }

    /// Cancel a pending job; unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when the scheduler task has shut down.
    pub fn cancel(&self, id: impl Into<String>) -> Result<(), SchedulerError> {
        self.tx
            .send(Command::Cancel { id: id.into() })
            .map_err(|_| SchedulerError::ShutDown)
    }

    /// Number of pending jobs
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.job_count.load(AtomicOrdering::Relaxed)
    }

    /// Whether the scheduler loop is alive
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(AtomicOrdering::Relaxed)
    }
}

/// Next occurrence of `hour:minute` IST strictly after `now`
fn next_daily_occurrence(hour: u32, minute: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let now_ist = now.with_timezone(&crate::config::ist());
    let today = now_ist
        .with_hour(hour)
        .and_then(|t| t.with_minute(minute))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0));

    match today {
        Some(t) if t > now_ist => t.with_timezone(&Utc),
        Some(t) => (t + ChronoDuration::days(1)).with_timezone(&Utc),
        // Unreachable for validated hour/minute; fall back to an hour out
        None => now + ChronoDuration::hours(1),
    }
}

async fn run_loop(
    mut rx: mpsc::UnboundedReceiver<Command>,
    job_count: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
) {
    let mut heap: BinaryHeap<Entry> = BinaryHeap::new();
    // Latest seq per live id; entries popped with an older seq are stale
    let mut live: HashMap<String, u64> = HashMap::new();
    let mut next_seq: u64 = 0;

    loop {
        let now = Utc::now();
        let next_deadline = heap.peek().map(|e| e.run_at);
        let sleep_for = next_deadline
            .map(|t| (t - now).to_std().unwrap_or_default())
            .unwrap_or(std::time::Duration::from_secs(3600));

        tokio::select! {
            maybe_cmd = rx.recv() => {
                match maybe_cmd {
                    Some(Command::Schedule { id, run_at, kind, job }) => {
                        next_seq += 1;
                        if live.insert(id.clone(), next_seq).is_some() {
                            debug!("Job {} replaced", id);
                        }
                        heap.push(Entry { run_at, seq: next_seq, id, kind, job });
                        job_count.store(live.len(), AtomicOrdering::Relaxed);
                    }
                    Some(Command::Cancel { id }) => {
                        if live.remove(&id).is_some() {
                            debug!("Job {} cancelled", id);
                            job_count.store(live.len(), AtomicOrdering::Relaxed);
                        }
                    }
                    None => {
                        info!("Scheduler channel closed, stopping");
                        break;
                    }
                }
            }
            () = tokio::time::sleep(sleep_for) => {
                fire_due(&mut heap, &mut live, &mut next_seq);
                job_count.store(live.len(), AtomicOrdering::Relaxed);
            }
        }
    }

    running.store(false, AtomicOrdering::Relaxed);
}

fn fire_due(heap: &mut BinaryHeap<Entry>, live: &mut HashMap<String, u64>, next_seq: &mut u64) {
    let now = Utc::now();

    while let Some(entry) = heap.peek() {
        if entry.run_at > now {
            break;
        }
        let Some(entry) = heap.pop() else { break };

        // Stale entries were replaced or cancelled after being queued
        if live.get(&entry.id) != Some(&entry.seq) {
            continue;
        }

        debug!("Firing job {}", entry.id);
        let job = Arc::clone(&entry.job);
        tokio::spawn(async move {
            job().await;
        });

        match entry.kind {
            Kind::OneShot => {
                live.remove(&entry.id);
            }
            Kind::Daily { hour, minute } => {
                *next_seq += 1;
                live.insert(entry.id.clone(), *next_seq);
                let run_at = next_daily_occurrence(hour, minute, now);
                heap.push(Entry {
                    run_at,
                    seq: *next_seq,
                    id: entry.id,
                    kind: entry.kind,
                    job: entry.job,
                });
            }
        }
    }

    if heap.len() > live.len() * 2 + 16 {
        // Shed accumulated stale entries
        warn!("Compacting scheduler heap ({} entries)", heap.len());
        let entries: Vec<Entry> = heap.drain().collect();
        heap.extend(
            entries
                .into_iter()
                .filter(|e| live.get(&e.id) == Some(&e.seq)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counter_job(counter: &Arc<AtomicUsize>) -> JobFn {
        let counter = Arc::clone(counter);
        job_fn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, AtomicOrdering::SeqCst);
            }
        })
    }

    #[tokio::test]
    async fn test_one_shot_fires() {
        let scheduler = Scheduler::start();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule_at(
                "job-1",
                Utc::now() + ChronoDuration::milliseconds(50),
                counter_job(&fired),
            )
            .expect("schedule");

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(fired.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(scheduler.job_count(), 0);
    }

    #[tokio::test]
    async fn test_past_deadline_fires_immediately() {
        let scheduler = Scheduler::start();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule_at(
                "late",
                Utc::now() - ChronoDuration::minutes(5),
                counter_job(&fired),
            )
            .expect("schedule");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_firing() {
        let scheduler = Scheduler::start();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule_at(
                "job-2",
                Utc::now() + ChronoDuration::milliseconds(150),
                counter_job(&fired),
            )
            .expect("schedule");
        scheduler.cancel("job-2").expect("cancel");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(scheduler.job_count(), 0);
    }

    #[tokio::test]
    async fn test_reschedule_replaces_pending_entry() {
        let scheduler = Scheduler::start();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule_at(
                "job-3",
                Utc::now() + ChronoDuration::milliseconds(100),
                counter_job(&first),
            )
            .expect("schedule");
        scheduler
            .schedule_at(
                "job-3",
                Utc::now() + ChronoDuration::milliseconds(200),
                counter_job(&second),
            )
            .expect("schedule");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(first.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(second.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ordering_earliest_first() {
        let scheduler = Scheduler::start();
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        for (id, delay_ms) in [("slow", 250), ("fast", 50)] {
            let order = Arc::clone(&order);
            scheduler
                .schedule_at(
                    id,
                    Utc::now() + ChronoDuration::milliseconds(delay_ms),
                    job_fn(move || {
                        let order = Arc::clone(&order);
                        async move {
                            order.lock().await.push(id);
                        }
                    }),
                )
                .expect("schedule");
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*order.lock().await, vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_daily_schedule_counts_as_pending() {
        let scheduler = Scheduler::start();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule_daily("briefing", 7, 0, counter_job(&fired))
            .expect("schedule");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(scheduler.job_count(), 1);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_daily_schedule_validation() {
        let next = next_daily_occurrence(7, 0, Utc::now());
        let next_ist = next.with_timezone(&crate::config::ist());
        assert_eq!(next_ist.hour(), 7);
        assert_eq!(next_ist.minute(), 0);
        assert!(next > Utc::now() - ChronoDuration::seconds(1));
    }

    #[test]
    fn test_next_daily_occurrence_rolls_forward() {
        // 2025-03-10 12:00 IST = 06:30 UTC
        let now = Utc
            .with_ymd_and_hms(2025, 3, 10, 6, 30, 0)
            .single()
            .expect("valid");
        // 07:00 IST already passed -> tomorrow
        let next = next_daily_occurrence(7, 0, now);
        let next_ist = next.with_timezone(&crate::config::ist());
        assert_eq!((next_ist.day(), next_ist.hour()), (11, 7));

        // 14:30 IST still ahead -> today
        let next = next_daily_occurrence(14, 30, now);
        let next_ist = next.with_timezone(&crate::config::ist());
        assert_eq!((next_ist.day(), next_ist.hour(), next_ist.minute()), (10, 14, 30));
    }
}
