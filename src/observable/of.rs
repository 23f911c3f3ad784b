use crate::{
  observable::Observable,
  observer::Observer,
  subscription::Teardown,
  type_hint::TypeHint,
};

/// Emits `value` once, then completes.
pub fn of<Item, Err>(value: Item) -> ObservableOf<Item, Err> {
  ObservableOf {
    value,
    _hint: TypeHint::new(),
  }
}

/// Completes immediately without emitting.
pub fn empty<Item, Err>() -> ObservableEmpty<Item, Err> { ObservableEmpty(TypeHint::new()) }

/// Errors immediately with `err`.
pub fn throw<Item, Err>(err: Err) -> ObservableThrow<Item, Err> {
  ObservableThrow {
    err,
    _hint: TypeHint::new(),
  }
}

#[derive(Clone)]
pub struct ObservableOf<Item, Err> {
  value: Item,
  _hint: TypeHint<Err>,
}

impl<Item, Err> Observable<Item, Err> for ObservableOf<Item, Err> {
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.next(self.value);
    observer.complete();
    Teardown::closed()
  }
}

#[derive(Clone)]
pub struct ObservableEmpty<Item, Err>(TypeHint<(Item, Err)>);

impl<Item, Err> Observable<Item, Err> for ObservableEmpty<Item, Err> {
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.complete();
    Teardown::closed()
  }
}

#[derive(Clone)]
pub struct ObservableThrow<Item, Err> {
  err: Err,
  _hint: TypeHint<Item>,
}

impl<Item, Err> Observable<Item, Err> for ObservableThrow<Item, Err> {
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.error(self.err);
    Teardown::closed()
  }
}
