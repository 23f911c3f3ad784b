use crate::{observable::Observable, observer::Observer, type_hint::TypeHint};

/// Calls `factory` once per subscription and subscribes to the observable it
/// returns, so each subscriber gets a fresh source.
pub fn defer<F, Src, Item, Err>(factory: F) -> Defer<F, Item, Err>
where
  F: Fn() -> Src,
  Src: Observable<Item, Err>,
{
  Defer {
    factory,
    _hint: TypeHint::new(),
  }
}

#[derive(Clone)]
pub struct Defer<F, Item, Err> {
  factory: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<F, Src, Item, Err> Observable<Item, Err> for Defer<F, Item, Err>
where
  F: Fn() -> Src,
  Src: Observable<Item, Err>,
{
  type Unsub = Src::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    (self.factory)().actual_subscribe(observer)
  }
}
