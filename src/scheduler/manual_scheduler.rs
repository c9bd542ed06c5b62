//! Virtual-time scheduler.
//!
//! Time only moves when [`ManualScheduler::advance_by`] (or `advance_to`,
//! `flush`) is called. Due tasks then run synchronously on the calling thread,
//! in order of their due time and FIFO among tasks due at the same instant,
//! with the clock set to each task's due time while it runs. This makes every
//! time-based operator fully deterministic under test, and lets a host with
//! its own tick loop (a game frame loop, a simulation step) drive the timers.
//!
//! ```
//! use rxlite::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let scheduler = ManualScheduler::new();
//! let subject = Subject::<i32>::new();
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//!
//! subject
//!   .clone()
//!   .delay(Duration::from_millis(100), scheduler.clone())
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//!
//! subject.next(1);
//! assert!(seen.lock().unwrap().is_empty());
//! scheduler.advance_by(Duration::from_millis(100));
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! ```

use std::{cmp::Ordering, collections::BinaryHeap, sync::Arc};

use parking_lot::Mutex;

use super::{Duration, Instant, OnceTask, RepeatingTask, Scheduler, TaskHandle};

/// Repeating tasks never tick faster than this, so a zero interval cannot
/// stall `advance_by`.
const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

// ==================== Internal State ====================

struct ManualState {
  origin: Instant,
  elapsed: Duration,
  next_task_id: u64,
  task_queue: BinaryHeap<ScheduledTask>,
}

enum TaskKind {
  Once(OnceTask),
  Repeating { interval: Duration, task: RepeatingTask },
}

struct ScheduledTask {
  due: Duration,
  task_id: u64,
  kind: TaskKind,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other.due.cmp(&self.due).then_with(|| other.task_id.cmp(&self.task_id))
  }
}

impl ManualState {
  fn push(&mut self, due: Duration, kind: TaskKind, handle: TaskHandle) {
    let task_id = self.next_task_id;
    self.next_task_id += 1;
    self.task_queue.push(ScheduledTask { due, task_id, kind, handle });
  }

  /// Pop the next live task due at or before `limit`, moving the clock to it.
  fn pop_due(&mut self, limit: Option<Duration>) -> Option<ScheduledTask> {
    loop {
      let due = self.task_queue.peek()?.due;
      if limit.is_some_and(|limit| due > limit) {
        return None;
      }
      let task = self.task_queue.pop()?;
      if task.handle.is_closed() {
        continue;
      }
      self.elapsed = self.elapsed.max(task.due);
      return Some(task);
    }
  }
}

// ==================== ManualScheduler ====================

/// A scheduler whose clock is advanced explicitly.
///
/// Cloning yields another handle to the same clock and task queue.
#[derive(Clone)]
pub struct ManualScheduler {
  state: Arc<Mutex<ManualState>>,
}

impl Default for ManualScheduler {
  fn default() -> Self { Self::new() }
}

impl ManualScheduler {
  /// A scheduler whose virtual clock starts at the current instant.
  pub fn new() -> Self { Self::starting_at(Instant::now()) }

  pub fn starting_at(origin: Instant) -> Self {
    Self {
      state: Arc::new(Mutex::new(ManualState {
        origin,
        elapsed: Duration::ZERO,
        next_task_id: 0,
        task_queue: BinaryHeap::new(),
      })),
    }
  }

  /// Virtual time elapsed since the scheduler was created.
  pub fn elapsed(&self) -> Duration { self.state.lock().elapsed }

  /// Number of queued tasks, cancelled ones included until they are purged.
  pub fn pending_count(&self) -> usize { self.state.lock().task_queue.len() }

  /// Whether no live task is queued.
  pub fn is_empty(&self) -> bool {
    self.state.lock().task_queue.iter().all(|task| task.handle.is_closed())
  }

  /// Advance virtual time by `duration`, running every task that falls due.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.elapsed() + duration;
    self.run_until(Some(target));
    let mut state = self.state.lock();
    state.elapsed = state.elapsed.max(target);
  }

  /// Advance virtual time to `elapsed` since creation. Moving backwards is a
  /// no-op.
  pub fn advance_to(&self, elapsed: Duration) {
    let current = self.elapsed();
    if elapsed > current {
      self.advance_by(elapsed - current);
    }
  }

  /// Run every one-shot task, advancing the clock to each one's due time.
  ///
  /// Repeating tasks would never drain, so they are left in the queue.
  pub fn flush(&self) {
    loop {
      let next_once = {
        let state = self.state.lock();
        state
          .task_queue
          .iter()
          .filter(|task| matches!(task.kind, TaskKind::Once(_)) && !task.handle.is_closed())
          .map(|task| task.due)
          .max()
      };
      match next_once {
        Some(due) => self.advance_to(due),
        None => break,
      }
    }
  }

  fn run_until(&self, limit: Option<Duration>) {
    loop {
      // The queue lock is released while a task runs, so tasks may schedule
      // or cancel other tasks.
      let task = self.state.lock().pop_due(limit);
      let Some(ScheduledTask { due, kind, handle, .. }) = task else {
        break;
      };

      match kind {
        TaskKind::Once(task) => {
          task();
          handle.finish();
        }
        TaskKind::Repeating { interval, mut task } => {
          task();
          if !handle.is_closed() {
            self.state.lock().push(due + interval, TaskKind::Repeating { interval, task }, handle);
          }
        }
      }
    }
  }
}

impl Scheduler for ManualScheduler {
  fn now(&self) -> Instant {
    let state = self.state.lock();
    state.origin + state.elapsed
  }

  fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut state = self.state.lock();
    let due = state.elapsed + delay;
    state.push(due, TaskKind::Once(task), handle.clone());
    handle
  }

  fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle {
    let interval = interval.max(MIN_REPEAT_INTERVAL);
    let handle = TaskHandle::new();
    let mut state = self.state.lock();
    let due = state.elapsed + interval;
    state.push(due, TaskKind::Repeating { interval, task }, handle.clone());
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

  use super::*;

  fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Clone + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c_count = count.clone();
    (count, move || {
      c_count.fetch_add(1, AtomicOrdering::SeqCst);
    })
  }

  #[test]
  fn schedule_once_runs_when_due() {
    let scheduler = ManualScheduler::new();
    let (count, inc) = counter();
    let handle = scheduler.schedule_once(Duration::from_millis(100), Box::new(inc));

    scheduler.advance_by(Duration::from_millis(99));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
    assert!(!handle.is_closed());

    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    assert!(handle.is_closed());

    scheduler.advance_by(Duration::from_secs(10));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
  }

  #[test]
  fn schedule_repeating_ticks_every_interval() {
    let scheduler = ManualScheduler::new();
    let (count, inc) = counter();
    let handle = scheduler.schedule_repeating(Duration::from_millis(100), Box::new(inc));

    scheduler.advance_by(Duration::from_millis(50));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
    scheduler.advance_by(Duration::from_millis(50));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    scheduler.advance_by(Duration::from_millis(1000));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 11);

    handle.cancel();
    scheduler.advance_by(Duration::from_millis(1000));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 11);
  }

  #[test]
  fn cancelled_task_never_runs() {
    let scheduler = ManualScheduler::new();
    let (count, inc) = counter();
    let handle = scheduler.schedule_once(Duration::from_millis(10), Box::new(inc));
    handle.cancel();
    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
    assert!(scheduler.is_empty());
  }

  #[test]
  fn clock_reads_due_time_inside_task() {
    let scheduler = ManualScheduler::new();
    let origin = scheduler.now();
    let seen = Arc::new(Mutex::new(None));
    let (c_seen, c_scheduler) = (seen.clone(), scheduler.clone());
    scheduler.schedule_once(
      Duration::from_millis(30),
      Box::new(move || *c_seen.lock() = Some(c_scheduler.now())),
    );

    scheduler.advance_by(Duration::from_millis(100));

    assert_eq!(*seen.lock(), Some(origin + Duration::from_millis(30)));
    assert_eq!(scheduler.elapsed(), Duration::from_millis(100));
  }

  #[test]
  fn same_due_time_runs_fifo() {
    let scheduler = ManualScheduler::new();
    let order = Arc::new(Mutex::new(vec![]));
    for i in 0..5 {
      let order = order.clone();
      scheduler.schedule_once(Duration::from_millis(10), Box::new(move || order.lock().push(i)));
    }
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
  }

  #[test]
  fn task_scheduled_by_task_runs_in_same_advance() {
    let scheduler = ManualScheduler::new();
    let (count, inc) = counter();
    let c_scheduler = scheduler.clone();
    scheduler.schedule_once(
      Duration::from_millis(10),
      Box::new(move || {
        c_scheduler.schedule_once(Duration::from_millis(10), Box::new(inc));
      }),
    );
    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
  }

  #[test]
  fn flush_runs_all_one_shots() {
    let scheduler = ManualScheduler::new();
    let (count, inc) = counter();
    scheduler.schedule_once(Duration::from_secs(5), Box::new(inc.clone()));
    scheduler.schedule_once(Duration::from_secs(50), Box::new(inc));
    scheduler.flush();
    assert_eq!(count.load(AtomicOrdering::SeqCst), 2);
    assert_eq!(scheduler.elapsed(), Duration::from_secs(50));
  }
}
