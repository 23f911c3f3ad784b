use smallvec::SmallVec;
use std::{
  fmt::{Debug, Formatter},
  mem,
  sync::{Arc, Mutex},
};

/// Handle returned from `Observable.subscribe` to allow unsubscribing.
///
/// Unsubscribing releases whatever resources the subscription holds. The
/// operation is closed: calling it again, from any number of call sites or
/// threads, has the effect of exactly one release.
pub trait Subscription {
  /// This allows deregistering a stream before it has finished receiving all
  /// events (i.e. before `complete` is called).
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

impl Debug for Box<dyn Subscription + Send> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Box<dyn Subscription>")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

type Release = Box<dyn FnOnce() + Send>;

/// A subscription wrapping zero or one release action.
///
/// The action is exchanged out of the shared slot on the first
/// `unsubscribe`, so exactly one caller runs it no matter how the calls
/// race.
#[derive(Clone, Default)]
pub struct Teardown(Arc<Mutex<Option<Release>>>);

impl Teardown {
  pub fn new<F: FnOnce() + Send + 'static>(release: F) -> Self {
    Teardown(Arc::new(Mutex::new(Some(Box::new(release)))))
  }

  /// A subscription that was never live: unsubscribing it does nothing.
  pub fn closed() -> Self { Teardown::default() }
}

impl Subscription for Teardown {
  fn unsubscribe(&mut self) {
    let release = self.0.lock().unwrap().take();
    if let Some(release) = release {
      release();
    }
  }

  fn is_closed(&self) -> bool { self.0.lock().unwrap().is_none() }
}

impl Debug for Teardown {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Teardown")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// Groups subscriptions so that unsubscribing the group unsubscribes every
/// member exactly once. Members added after the group closed are
/// unsubscribed immediately.
#[derive(Clone, Default)]
pub struct CompositeSubscription(Arc<Mutex<Inner>>);

struct Inner {
  closed: bool,
  teardown: SmallVec<[Box<dyn Subscription + Send>; 1]>,
}

impl Default for Inner {
  fn default() -> Self {
    Inner {
      closed: false,
      teardown: SmallVec::new(),
    }
  }
}

impl CompositeSubscription {
  pub fn add<S: Subscription + Send + 'static>(&self, mut subscription: S) {
    let mut inner = self.0.lock().unwrap();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|s| !s.is_closed());
      inner.teardown.push(Box::new(subscription));
    }
  }

  pub fn teardown_size(&self) -> usize { self.0.lock().unwrap().teardown.len() }
}

impl Subscription for CompositeSubscription {
  fn unsubscribe(&mut self) {
    let teardown = {
      let mut inner = self.0.lock().unwrap();
      if inner.closed {
        return;
      }
      inner.closed = true;
      mem::take(&mut inner.teardown)
    };
    // Run members outside the lock: a member's release action may touch
    // this group again.
    for mut subscription in teardown {
      subscription.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.lock().unwrap().closed }
}

impl Debug for CompositeSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.lock().unwrap();
    f.debug_struct("CompositeSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}

impl<T: ?Sized> Subscription for Box<T>
where
  T: Subscription,
{
  #[inline]
  fn unsubscribe(&mut self) {
    let s = &mut **self;
    s.unsubscribe()
  }

  #[inline]
  fn is_closed(&self) -> bool {
    let s = &**self;
    s.is_closed()
  }
}

impl<T> Subscription for Arc<Mutex<T>>
where
  T: Subscription,
{
  #[inline]
  fn unsubscribe(&mut self) { self.lock().unwrap().unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.lock().unwrap().is_closed() }
}

/// An RAII implementation of a "scoped subscription". When this structure is
/// dropped (falls out of scope), the subscription will be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(pub(crate) T);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}
