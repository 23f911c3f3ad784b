use crate::{
  observable::Observable,
  observer::Observer,
  ops::ref_count::RefCount,
  scheduler::{Duration, Scheduler},
  subject::Subject,
  subscription::{Subscription, Teardown},
};
use std::sync::{Arc, Mutex, Weak};

type ConnectionSlot = Arc<Mutex<Option<ConnectionHandle>>>;

/// An observable whose subscribers attach to a shared subject, and which
/// only subscribes the underlying source when `connect` is called.
///
/// Clones share the subject and the connection, so every clone serves the
/// same multicast session.
pub struct ConnectableObservable<S, Item, Err> {
  source: S,
  subject: Subject<Item, Err>,
  connection: ConnectionSlot,
}

impl<S: Clone, Item, Err> Clone for ConnectableObservable<S, Item, Err> {
  fn clone(&self) -> Self {
    ConnectableObservable {
      source: self.source.clone(),
      subject: self.subject.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<S, Item, Err> ConnectableObservable<S, Item, Err> {
  pub fn new(source: S, subject: Subject<Item, Err>) -> Self {
    ConnectableObservable {
      source,
      subject,
      connection: Arc::new(Mutex::new(None)),
    }
  }

  pub fn is_connected(&self) -> bool { self.connection.lock().unwrap().is_some() }

  pub fn subject(&self) -> &Subject<Item, Err> { &self.subject }
}

impl<S, Item, Err> ConnectableObservable<S, Item, Err>
where
  S: Observable<Item, Err> + Clone,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  /// Subscribe the shared subject to the source. While a connection is
  /// live, calling `connect` again returns a handle to that same
  /// connection instead of opening a second one; after the handle is
  /// unsubscribed, `connect` opens a fresh one.
  pub fn connect(&self) -> ConnectionHandle {
    let handle = {
      let mut slot = self.connection.lock().unwrap();
      if let Some(existing) = slot.as_ref() {
        return existing.clone();
      }
      let handle = ConnectionHandle::new(Arc::downgrade(&self.connection));
      *slot = Some(handle.clone());
      handle
    };
    // Subscribe with the slot unlocked: a synchronous source may complete,
    // or a subscriber callback may dispose the connection, before
    // `actual_subscribe` returns.
    let upstream = self.source.clone().actual_subscribe(self.subject.clone());
    handle.set_upstream(Box::new(upstream));
    handle
  }

  /// Share via reference counting: connect on the first subscriber,
  /// disconnect when the last one leaves.
  pub fn ref_count(self) -> RefCount<S, Item, Err> { RefCount::eager(self) }

  /// Like `ref_count`, but once the subscriber count drops to zero the
  /// disconnect is deferred by `delay` on `scheduler`; a subscriber
  /// arriving within the window keeps the connection alive.
  ///
  /// # Panics
  ///
  /// Panics if `delay` is zero; use `ref_count` for the eager behavior.
  pub fn ref_count_delayed(
    self,
    delay: Duration,
    scheduler: Arc<dyn Scheduler + Send + Sync>,
  ) -> RefCount<S, Item, Err> {
    assert!(
      !delay.is_zero(),
      "ref_count_delayed requires a non-zero delay"
    );
    RefCount::delayed(self, delay, scheduler)
  }
}

impl<S, Item, Err> Observable<Item, Err> for ConnectableObservable<S, Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    self.subject.actual_subscribe(observer)
  }
}

struct ConnectionInner {
  closed: bool,
  upstream: Option<Box<dyn Subscription + Send>>,
  slot: Weak<Mutex<Option<ConnectionHandle>>>,
}

/// Handle for one live connection. Unsubscribing tears down the source
/// subscription and lets the owning connectable reconnect later.
#[derive(Clone)]
pub struct ConnectionHandle {
  inner: Arc<Mutex<ConnectionInner>>,
}

impl ConnectionHandle {
  fn new(slot: Weak<Mutex<Option<ConnectionHandle>>>) -> Self {
    ConnectionHandle {
      inner: Arc::new(Mutex::new(ConnectionInner {
        closed: false,
        upstream: None,
        slot,
      })),
    }
  }

  fn set_upstream(&self, mut upstream: Box<dyn Subscription + Send>) {
    let mut inner = self.inner.lock().unwrap();
    if inner.closed {
      drop(inner);
      upstream.unsubscribe();
    } else {
      inner.upstream = Some(upstream);
    }
  }

  fn same_connection(&self, other: &ConnectionHandle) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  /// Close the handle and clear the owner's connection marker, handing the
  /// upstream back to the caller instead of releasing it. Lets a caller
  /// serialize the marker update under its own lock and run the teardown
  /// outside it.
  pub(crate) fn detach(&self) -> Option<Box<dyn Subscription + Send>> {
    let (upstream, slot) = {
      let mut inner = self.inner.lock().unwrap();
      if inner.closed {
        return None;
      }
      inner.closed = true;
      (inner.upstream.take(), std::mem::take(&mut inner.slot))
    };
    // Clear the connectable's marker first so a teardown callback that
    // reconnects sees a disconnected state.
    if let Some(slot) = slot.upgrade() {
      let mut current = slot.lock().unwrap();
      if current.as_ref().map_or(false, |c| c.same_connection(self)) {
        *current = None;
      }
    }
    upstream
  }
}

impl Subscription for ConnectionHandle {
  fn unsubscribe(&mut self) {
    if let Some(mut upstream) = self.detach() {
      upstream.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.inner.lock().unwrap().closed }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::{create, of};
  use crate::observer::BoxObserver;

  #[test]
  fn source_not_subscribed_until_connect() {
    let subscribes = Arc::new(Mutex::new(0));
    let s = subscribes.clone();
    let source = create(move |mut observer: BoxObserver<i32, ()>| {
      *s.lock().unwrap() += 1;
      observer.next(5);
      observer.complete();
      Teardown::closed()
    });

    let connectable = source.publish();
    let seen = Arc::new(Mutex::new(vec![]));
    let v = seen.clone();
    let _sub = connectable.clone().subscribe(move |value| v.lock().unwrap().push(value));
    assert_eq!(*subscribes.lock().unwrap(), 0);
    assert!(seen.lock().unwrap().is_empty());

    connectable.connect();
    assert_eq!(*subscribes.lock().unwrap(), 1);
    assert_eq!(*seen.lock().unwrap(), vec![5]);
  }

  #[test]
  fn repeated_connect_shares_the_live_connection() {
    let subscribes = Arc::new(Mutex::new(0));
    let s = subscribes.clone();
    let source = create(move |_: BoxObserver<i32, ()>| {
      *s.lock().unwrap() += 1;
      Teardown::closed()
    });

    let connectable = source.publish();
    let first = connectable.connect();
    let second = connectable.connect();
    assert!(first.same_connection(&second));
    assert_eq!(*subscribes.lock().unwrap(), 1);
  }

  #[test]
  fn disconnect_allows_reconnect() {
    let subscribes = Arc::new(Mutex::new(0));
    let teardowns = Arc::new(Mutex::new(0));
    let s = subscribes.clone();
    let t = teardowns.clone();
    let source = create(move |_: BoxObserver<i32, ()>| {
      *s.lock().unwrap() += 1;
      let t = t.clone();
      Teardown::new(move || *t.lock().unwrap() += 1)
    });

    let connectable = source.publish();
    let mut connection = connectable.connect();
    connection.unsubscribe();
    assert_eq!(*teardowns.lock().unwrap(), 1);
    assert!(!connectable.is_connected());

    connectable.connect();
    assert_eq!(*subscribes.lock().unwrap(), 2);
  }

  #[test]
  fn handle_closed_before_upstream_arrives_tears_down() {
    // A handle disposed while `connect` is mid-subscribe must still
    // release the upstream when it lands.
    let torn_down = Arc::new(Mutex::new(false));
    let handle = ConnectionHandle::new(Weak::new());
    let mut h = handle.clone();
    h.unsubscribe();

    let t = torn_down.clone();
    handle.set_upstream(Box::new(Teardown::new(move || *t.lock().unwrap() = true)));
    assert!(*torn_down.lock().unwrap());
  }

  #[test]
  fn connectable_multicasts_to_all_subscribers() {
    let connectable = of::<_, ()>(9).publish();
    let first = Arc::new(Mutex::new(vec![]));
    let second = Arc::new(Mutex::new(vec![]));

    let f = first.clone();
    let _s1 = connectable.clone().subscribe(move |v| f.lock().unwrap().push(v));
    let s = second.clone();
    let _s2 = connectable.clone().subscribe(move |v| s.lock().unwrap().push(v));

    connectable.connect();
    assert_eq!(*first.lock().unwrap(), vec![9]);
    assert_eq!(*second.lock().unwrap(), vec![9]);
  }
}
