use crate::{
  observable::{ConnectableObservable, ConnectionHandle, Observable},
  observer::Observer,
  scheduler::{Duration, Scheduler, TaskHandle},
  subscription::{Subscription, Teardown},
};
use std::sync::{Arc, Mutex};

/// When the grace period is set, a disconnect is scheduled instead of done
/// inline once the subscriber count hits zero.
#[derive(Clone)]
struct DisconnectPolicy {
  delay: Duration,
  scheduler: Arc<dyn Scheduler + Send + Sync>,
}

#[derive(Default)]
struct RefCountState {
  count: usize,
  connection: Option<ConnectionHandle>,
  pending_disconnect: Option<TaskHandle>,
}

/// Reference-counted view over a [`ConnectableObservable`].
///
/// The first subscriber connects the source; dropping to zero subscribers
/// disconnects it, either immediately or after a grace period. A later
/// subscriber starts a whole new connection.
pub struct RefCount<S, Item, Err> {
  connectable: ConnectableObservable<S, Item, Err>,
  state: Arc<Mutex<RefCountState>>,
  policy: Option<DisconnectPolicy>,
}

impl<S: Clone, Item, Err> Clone for RefCount<S, Item, Err> {
  fn clone(&self) -> Self {
    RefCount {
      connectable: self.connectable.clone(),
      state: self.state.clone(),
      policy: self.policy.clone(),
    }
  }
}

impl<S, Item, Err> RefCount<S, Item, Err> {
  pub(crate) fn eager(connectable: ConnectableObservable<S, Item, Err>) -> Self {
    RefCount {
      connectable,
      state: Arc::new(Mutex::new(RefCountState::default())),
      policy: None,
    }
  }

  pub(crate) fn delayed(
    connectable: ConnectableObservable<S, Item, Err>,
    delay: Duration,
    scheduler: Arc<dyn Scheduler + Send + Sync>,
  ) -> Self {
    RefCount {
      connectable,
      state: Arc::new(Mutex::new(RefCountState::default())),
      policy: Some(DisconnectPolicy { delay, scheduler }),
    }
  }
}

impl<S, Item, Err> Observable<Item, Err> for RefCount<S, Item, Err>
where
  S: Observable<Item, Err> + Clone,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Unsub = RefCountSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    {
      let mut state = self.state.lock().unwrap();
      if let Some(mut pending) = state.pending_disconnect.take() {
        pending.unsubscribe();
      }
      state.count += 1;
    }

    // Attach the observer to the subject before connecting, so a source
    // that emits synchronously on subscribe reaches this observer too.
    let inner = self.connectable.clone().actual_subscribe(observer);

    let need_connect = self.state.lock().unwrap().connection.is_none();
    if need_connect {
      // `connect` is idempotent while live, so a racing subscriber at
      // worst stores the same handle twice.
      let handle = self.connectable.connect();
      self.state.lock().unwrap().connection = Some(handle);
    }

    RefCountSubscription {
      inner,
      state: self.state,
      policy: self.policy,
      detached: false,
    }
  }
}

/// Subscription handed to each `RefCount` subscriber. Unsubscribing detaches
/// the observer and, if this was the last subscriber, tears the shared
/// connection down per the disconnect policy.
pub struct RefCountSubscription {
  inner: Teardown,
  state: Arc<Mutex<RefCountState>>,
  policy: Option<DisconnectPolicy>,
  detached: bool,
}

impl Subscription for RefCountSubscription {
  fn unsubscribe(&mut self) {
    if self.detached {
      return;
    }
    self.detached = true;
    self.inner.unsubscribe();

    let mut state = self.state.lock().unwrap();
    state.count -= 1;
    if state.count > 0 {
      return;
    }
    match &self.policy {
      None => {
        // Detach while the count lock is held: the connectable's marker
        // and this count must transition as one step, or a racing
        // subscriber can adopt a connection that is about to die.
        let upstream = state
          .connection
          .take()
          .and_then(|connection| connection.detach());
        drop(state);
        if let Some(mut upstream) = upstream {
          upstream.unsubscribe();
        }
      }
      Some(policy) => {
        if state.pending_disconnect.is_some() {
          return;
        }
        let shared = self.state.clone();
        // The action locks the shared state, so even if the scheduler
        // fires immediately it blocks until the handle is stored.
        let handle = policy.scheduler.schedule(
          policy.delay,
          Box::new(move || {
            let upstream = {
              let mut state = shared.lock().unwrap();
              state.pending_disconnect = None;
              if state.count == 0 {
                state
                  .connection
                  .take()
                  .and_then(|connection| connection.detach())
              } else {
                None
              }
            };
            if let Some(mut upstream) = upstream {
              upstream.unsubscribe();
            }
          }),
        );
        state.pending_disconnect = Some(handle);
      }
    }
  }

  fn is_closed(&self) -> bool { self.detached }
}
