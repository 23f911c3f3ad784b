use crate::scheduler::{Duration, Scheduler, TaskHandle};
use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  sync::{Arc, Mutex},
};

struct ScheduledTask {
  due: Duration,
  task_id: u64,
  action: Option<Box<dyn FnOnce() + Send>>,
  handle: TaskHandle,
}

// Reversed ordering turns the max-heap into a min-heap; the id tiebreak
// keeps same-instant tasks in scheduling order.
impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: u64,
}

/// Scheduler over a virtual clock, for deterministic tests.
///
/// Time only moves when `advance_to`, `advance_by` or `flush` is called.
/// Clones share the clock and the queue, so a clone can be handed to the
/// code under test while the test drives time from outside.
#[derive(Clone, Default)]
pub struct TestScheduler {
  state: Arc<Mutex<TestSchedulerState>>,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Enqueue `action` to run at the absolute virtual instant `due`. An
  /// instant not later than the current time runs on the next advance.
  pub fn schedule_at(&self, due: Duration, action: Box<dyn FnOnce() + Send>) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut state = self.state.lock().unwrap();
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    state.task_queue.push(ScheduledTask {
      due,
      task_id,
      action: Some(action),
      handle: handle.clone(),
    });
    handle
  }

  /// Run every task due at or before `target`, in due-time order, then move
  /// the clock to `target`. Actions run with the queue unlocked, so they may
  /// schedule further tasks; tasks they enqueue within the window run in the
  /// same pass.
  pub fn advance_to(&self, target: Duration) {
    loop {
      let task = {
        let mut state = self.state.lock().unwrap();
        match state.task_queue.peek() {
          Some(task) if task.due <= target => {
            let mut task = state.task_queue.pop().unwrap();
            if state.virtual_time < task.due {
              state.virtual_time = task.due;
            }
            task.action.take().map(|action| (action, task.handle))
          }
          _ => {
            if state.virtual_time < target {
              state.virtual_time = target;
            }
            return;
          }
        }
      };
      if let Some((action, handle)) = task {
        if !handle.is_cancelled() {
          action();
        }
        handle.mark_finished();
      }
    }
  }

  pub fn advance_by(&self, duration: Duration) {
    let target = self.now() + duration;
    self.advance_to(target);
  }

  /// Run the queue to exhaustion, advancing the clock to each task's due
  /// time as it goes.
  pub fn flush(&self) {
    loop {
      let due = {
        let state = self.state.lock().unwrap();
        match state.task_queue.peek() {
          Some(task) => task.due,
          None => return,
        }
      };
      self.advance_to(due);
    }
  }

  pub fn pending_count(&self) -> usize { self.state.lock().unwrap().task_queue.len() }

  pub fn is_empty(&self) -> bool { self.pending_count() == 0 }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration { self.state.lock().unwrap().virtual_time }

  fn schedule(&self, delay: Duration, action: Box<dyn FnOnce() + Send>) -> TaskHandle {
    let due = self.now() + delay;
    self.schedule_at(due, action)
  }
}
