//! Timer scheduling for deferred workspace events
//!
//! Components never sleep. They hand an event and a delay to a
//! [`Scheduler`], which delivers the event once the delay has elapsed.
//! [`TokioScheduler`] does this with real timers; [`ManualScheduler`] keeps
//! a virtual clock that tests advance explicitly.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;

use crate::event::{EventSink, WorkspaceEvent};

/// Identifier of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Clock plus deferred delivery of [`WorkspaceEvent`]s
///
/// Events fire in the order their delays elapse, not in the order they were
/// scheduled.
pub trait Scheduler: Send + Sync {
    /// Current time according to this scheduler
    fn now(&self) -> DateTime<Utc>;

    /// Deliver `event` after `delay`
    fn schedule(&self, delay: Duration, event: WorkspaceEvent) -> TimerId;

    /// Best-effort removal of a timer that has not fired yet
    ///
    /// Returns `true` if the timer was still pending.
    fn cancel(&self, id: TimerId) -> bool;
}

/// `start + delay`, saturating at the latest representable instant
pub fn deadline_after(start: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| start.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Wall-clock scheduler backed by tokio timers
///
/// Must be used from within a tokio runtime. Fired events are pushed into
/// the [`EventSink`] given at construction.
pub struct TokioScheduler {
    sink: EventSink,
    next_id: AtomicU64,
    timers: Arc<Mutex<HashMap<TimerId, AbortHandle>>>,
}

impl TokioScheduler {
    /// Create a scheduler delivering into `sink`
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            next_id: AtomicU64::new(1),
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of timers that have not fired yet
    pub fn pending(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn schedule(&self, delay: Duration, event: WorkspaceEvent) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let sink = self.sink.clone();
        let timers = Arc::clone(&self.timers);

        // Hold the lock across spawn so the task cannot remove its entry
        // before it has been inserted.
        let mut guard = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut timers) = timers.lock() {
                timers.remove(&id);
            }
            if sink.send(event).is_err() {
                tracing::debug!(timer = id.0, "Event receiver dropped, timer output discarded");
            }
        });
        guard.insert(id, task.abort_handle());

        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let handle = self.timers.lock().ok().and_then(|mut t| t.remove(&id));
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if let Ok(mut timers) = self.timers.lock() {
            for (_, handle) in timers.drain() {
                handle.abort();
            }
        }
    }
}

#[derive(Debug)]
struct ManualState {
    now: DateTime<Utc>,
    next_seq: u64,
    queue: BTreeMap<(DateTime<Utc>, u64), WorkspaceEvent>,
}

/// Deterministic scheduler driven by a virtual clock
///
/// Cloning yields another handle to the same clock and queue, so a test can
/// keep one handle while the sessions own another.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use codechat::chat::MessageId;
/// use codechat::event::WorkspaceEvent;
/// use codechat::scheduler::{ManualScheduler, Scheduler};
///
/// let scheduler = ManualScheduler::new();
/// let event = WorkspaceEvent::PeerReply { in_reply_to: MessageId(1) };
/// scheduler.schedule(Duration::from_millis(1000), event.clone());
///
/// assert!(scheduler.advance(Duration::from_millis(999)).is_empty());
/// assert_eq!(scheduler.advance(Duration::from_millis(1)), vec![event]);
/// ```
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    /// Virtual clock starting at the current wall-clock time
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Virtual clock starting at `start`
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: start,
                next_seq: 0,
                queue: BTreeMap::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move the clock forward by `by` and return every event that became due
    ///
    /// Events are returned ordered by due time, ties broken by scheduling
    /// order.
    pub fn advance(&self, by: Duration) -> Vec<WorkspaceEvent> {
        let mut state = self.lock();
        let target = deadline_after(state.now, by);

        let mut fired = Vec::new();
        while let Some(entry) = state.queue.first_entry() {
            if entry.key().0 > target {
                break;
            }
            fired.push(entry.remove());
        }
        state.now = target;
        fired
    }

    /// Advance just far enough to fire the earliest pending event
    pub fn fire_next(&self) -> Option<WorkspaceEvent> {
        let mut state = self.lock();
        let entry = state.queue.first_entry()?;
        let due = entry.key().0;
        let event = entry.remove();
        if due > state.now {
            state.now = due;
        }
        Some(event)
    }

    /// Number of events still waiting for their delay to elapse
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn schedule(&self, delay: Duration, event: WorkspaceEvent) -> TimerId {
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = deadline_after(state.now, delay);
        state.queue.insert((due, seq), event);
        TimerId(seq)
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.lock();
        let key = state.queue.keys().find(|(_, seq)| *seq == id.0).copied();
        match key {
            Some(key) => state.queue.remove(&key).is_some(),
            None => false,
        }
    }
}
