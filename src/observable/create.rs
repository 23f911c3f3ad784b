use crate::{
  observable::Observable,
  observer::{AutoDetachObserver, BoxObserver, Observer},
  subscription::{CompositeSubscription, Subscription},
  type_hint::TypeHint,
};

/// Build an observable from a subscribe function.
///
/// The function receives the downstream observer and returns the teardown
/// for whatever it started. The observer handed in is gated: after the
/// subscription is unsubscribed, or after the function delivers a terminal
/// notification, further calls are dropped on the floor.
pub fn create<F, U, Item, Err>(subscribe: F) -> Create<F, Item, Err>
where
  F: FnOnce(BoxObserver<Item, Err>) -> U,
  U: Subscription + Send + 'static,
{
  Create {
    subscribe,
    _hint: TypeHint::new(),
  }
}

#[derive(Clone)]
pub struct Create<F, Item, Err> {
  subscribe: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<F, U, Item, Err> Observable<Item, Err> for Create<F, Item, Err>
where
  F: FnOnce(BoxObserver<Item, Err>) -> U,
  U: Subscription + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let gate = AutoDetachObserver::new(observer);
    let subscription = CompositeSubscription::default();
    // The gate goes in first so disposal stops delivery before the
    // producer's teardown runs.
    subscription.add(gate.clone());
    let boxed: BoxObserver<Item, Err> = Box::new(gate);
    subscription.add((self.subscribe)(boxed));
    subscription
  }
}
