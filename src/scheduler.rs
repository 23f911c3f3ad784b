use crate::subscription::Subscription;
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

pub use std::time::Duration;

pub mod test_scheduler;

/// Something that can run actions later.
///
/// `now` is the scheduler's own clock, not necessarily wall time; a
/// virtual-time implementation advances it only when told to.
pub trait Scheduler {
  fn now(&self) -> Duration;

  /// Run `action` once `delay` has elapsed on this scheduler's clock. The
  /// returned handle cancels the action if it has not started yet.
  fn schedule(&self, delay: Duration, action: Box<dyn FnOnce() + Send>) -> TaskHandle;
}

#[derive(Default, Debug)]
struct TaskHandleInner {
  cancelled: AtomicBool,
  finished: AtomicBool,
}

/// Cancellation handle for a scheduled action.
///
/// Cancelling after the action ran is a no-op. A handle is closed once the
/// action either ran or was cancelled.
#[derive(Clone, Default, Debug)]
pub struct TaskHandle {
  inner: Arc<TaskHandleInner>,
}

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  pub(crate) fn mark_finished(&self) { self.inner.finished.store(true, Ordering::SeqCst); }

  pub fn is_cancelled(&self) -> bool { self.inner.cancelled.load(Ordering::SeqCst) }

  pub fn is_finished(&self) -> bool { self.inner.finished.load(Ordering::SeqCst) }
}

impl Subscription for TaskHandle {
  fn unsubscribe(&mut self) { self.inner.cancelled.store(true, Ordering::SeqCst); }

  fn is_closed(&self) -> bool { self.is_cancelled() || self.is_finished() }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn handle_states() {
    let mut handle = TaskHandle::new();
    assert!(!handle.is_closed());

    handle.unsubscribe();
    assert!(handle.is_cancelled());
    assert!(handle.is_closed());
    assert!(!handle.is_finished());

    let handle = TaskHandle::new();
    handle.mark_finished();
    assert!(handle.is_closed());
    assert!(!handle.is_cancelled());
  }
}
