use crate::{
  observer::{AllObserver, FnMutObserver, Observer},
  subject::Subject,
  subscription::{Subscription, SubscriptionGuard},
};

mod connectable;
mod create;
mod defer;
mod of;

pub use connectable::{ConnectableObservable, ConnectionHandle};
pub use create::{create, Create};
pub use defer::{defer, Defer};
pub use of::{empty, of, throw, ObservableEmpty, ObservableOf, ObservableThrow};

/// A push-based stream of values terminated by at most one `error` or
/// `complete` notification.
///
/// Subscribing consumes the observable; sources that can serve more than
/// one subscription are `Clone`, and each clone subscribes independently.
pub trait Observable<Item, Err>: Sized {
  /// Handle the caller uses to stop this particular subscription.
  type Unsub: Subscription + Send + 'static;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static;

  /// Subscribe with a value callback only. Errors terminate the stream
  /// silently; use [`Observable::subscribe_all`] to observe them.
  fn subscribe<N>(self, next: N) -> Self::Unsub
  where
    N: FnMut(Item) + Send + 'static,
  {
    self.actual_subscribe(FnMutObserver::new(next))
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Self::Unsub
  where
    N: FnMut(Item) + Send + 'static,
    E: FnMut(Err) + Send + 'static,
    C: FnMut() + Send + 'static,
  {
    self.actual_subscribe(AllObserver::new(next, error, complete))
  }

  fn subscribe_with<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    self.actual_subscribe(observer)
  }

  /// Subscribe and tie the subscription's lifetime to the returned guard.
  fn subscribe_guard<N>(self, next: N) -> SubscriptionGuard<Self::Unsub>
  where
    N: FnMut(Item) + Send + 'static,
  {
    SubscriptionGuard::new(self.subscribe(next))
  }

  /// Share this source through `subject`. Subscribers attach to the subject;
  /// the source is not subscribed until [`ConnectableObservable::connect`].
  fn multicast(self, subject: Subject<Item, Err>) -> ConnectableObservable<Self, Item, Err>
  where
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    ConnectableObservable::new(self, subject)
  }

  /// `multicast` through a fresh subject.
  fn publish(self) -> ConnectableObservable<Self, Item, Err>
  where
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    self.multicast(Subject::new())
  }
}
