use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Cancellation token for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    pub due: Duration,
    pub task: T,
}

/// Single-threaded timer queue over a virtual clock.
///
/// Time only moves when the owner calls [`Scheduler::advance`] or
/// [`Scheduler::advance_to`]; due tasks are handed back in deadline order
/// (ties in scheduling order) instead of being run as callbacks, so the owner
/// applies them against whatever state it still holds.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        let deadline = self.now.saturating_add(delay);
        self.schedule_at(deadline, task)
    }

    /// Schedules at an absolute point of the virtual timeline. A deadline
    /// already in the past fires on the next advance.
    pub fn schedule_at(&mut self, deadline: Duration, task: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((deadline, seq), task);
        self.deadlines.insert(seq, deadline);
        TimerHandle(seq)
    }

    /// Removes a pending task. Returns `None` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let deadline = self.deadlines.remove(&handle.0)?;
        self.queue.remove(&(deadline, handle.0))
    }

    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.deadlines.clear();
        dropped
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn advance(&mut self, by: Duration) -> Vec<Fired<T>> {
        let target = self.now.saturating_add(by);
        self.advance_to(target)
    }

    /// Moves the clock to `instant` (never backwards) and drains every task
    /// whose deadline has been reached.
    pub fn advance_to(&mut self, instant: Duration) -> Vec<Fired<T>> {
        if instant > self.now {
            self.now = instant;
        }
        let mut fired = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            let (due, seq) = *entry.key();
            if due > self.now {
                break;
            }
            let task = entry.remove();
            self.deadlines.remove(&seq);
            fired.push(Fired {
                handle: TimerHandle(seq),
                due,
                task,
            });
        }
        fired
    }
}

/// Maps wall-clock time onto a scheduler's virtual timeline.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}
