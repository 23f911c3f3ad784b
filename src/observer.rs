use crate::subscription::Subscription;
use std::sync::{Arc, Mutex};

/// An Observer is a consumer of values delivered by an Observable. One for each
/// type of notification delivered by the Observable: `next`, `error`,
/// and `complete`.
///
/// `Item` the type of the elements being emitted.
/// `Err` the type of the error may propagating.
pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);
  fn error(&mut self, err: Err);
  fn complete(&mut self);
  fn is_closed(&self) -> bool;
}

pub type BoxObserver<Item, Err> = Box<dyn Observer<Item, Err> + Send>;

impl<Item, Err, T> Observer<Item, Err> for Box<T>
where
  T: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }
  #[inline]
  fn error(&mut self, err: Err) { (**self).error(err) }
  #[inline]
  fn complete(&mut self) { (**self).complete() }
  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Observer that forwards each value to a closure and silently drops the
/// terminal notifications. Errors are discarded; use
/// [`AllObserver`] when they matter.
pub struct FnMutObserver<F> {
  func: F,
  stopped: bool,
}

impl<F> FnMutObserver<F> {
  pub fn new(func: F) -> Self { FnMutObserver { func, stopped: false } }
}

impl<Item, Err, F> Observer<Item, Err> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  fn next(&mut self, value: Item) {
    if !self.stopped {
      (self.func)(value)
    }
  }

  fn error(&mut self, _err: Err) { self.stopped = true; }

  fn complete(&mut self) { self.stopped = true; }

  fn is_closed(&self) -> bool { self.stopped }
}

/// Observer built from three closures, one per notification kind. After a
/// terminal notification every later call is ignored.
pub struct AllObserver<N, E, C> {
  next: N,
  error: E,
  complete: C,
  stopped: bool,
}

impl<N, E, C> AllObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self {
    AllObserver {
      next,
      error,
      complete,
      stopped: false,
    }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for AllObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnMut(Err),
  C: FnMut(),
{
  fn next(&mut self, value: Item) {
    if !self.stopped {
      (self.next)(value)
    }
  }

  fn error(&mut self, err: Err) {
    if self.stopped {
      return;
    }
    self.stopped = true;
    (self.error)(err)
  }

  fn complete(&mut self) {
    if self.stopped {
      return;
    }
    self.stopped = true;
    (self.complete)()
  }

  fn is_closed(&self) -> bool { self.stopped }
}

struct DetachInner<O> {
  observer: Option<O>,
  closed: bool,
}

/// Shared gate in front of a downstream observer.
///
/// Delivery and disposal race freely: `clear` detaches the observer so no
/// notification started afterwards reaches it, and a terminal notification
/// detaches it too. The observer is taken out of the slot for the duration
/// of each callback, so disposing from inside a callback never deadlocks;
/// dispose wins and the observer is not put back.
pub struct AutoDetachObserver<O> {
  inner: Arc<Mutex<DetachInner<O>>>,
}

impl<O> Clone for AutoDetachObserver<O> {
  fn clone(&self) -> Self {
    AutoDetachObserver {
      inner: self.inner.clone(),
    }
  }
}

impl<O> AutoDetachObserver<O> {
  pub fn new(observer: O) -> Self {
    AutoDetachObserver {
      inner: Arc::new(Mutex::new(DetachInner {
        observer: Some(observer),
        closed: false,
      })),
    }
  }

  /// Detach the downstream observer without delivering anything.
  pub fn clear(&self) {
    let mut inner = self.inner.lock().unwrap();
    inner.closed = true;
    inner.observer.take();
  }
}

impl<Item, Err, O> Observer<Item, Err> for AutoDetachObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let observer = self.inner.lock().unwrap().observer.take();
    if let Some(mut observer) = observer {
      observer.next(value);
      let mut inner = self.inner.lock().unwrap();
      if !inner.closed {
        inner.observer = Some(observer);
      }
    }
  }

  fn error(&mut self, err: Err) {
    let observer = {
      let mut inner = self.inner.lock().unwrap();
      if inner.closed {
        return;
      }
      inner.closed = true;
      inner.observer.take()
    };
    if let Some(mut observer) = observer {
      observer.error(err);
    }
  }

  fn complete(&mut self) {
    let observer = {
      let mut inner = self.inner.lock().unwrap();
      if inner.closed {
        return;
      }
      inner.closed = true;
      inner.observer.take()
    };
    if let Some(mut observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.inner.lock().unwrap().closed }
}

impl<O> Subscription for AutoDetachObserver<O> {
  fn unsubscribe(&mut self) { self.clear() }

  fn is_closed(&self) -> bool { self.inner.lock().unwrap().closed }
}
