use crate::{
  observable::Observable,
  observer::{AutoDetachObserver, BoxObserver, Observer},
  subscription::{Subscription, Teardown},
};
use smallvec::SmallVec;
use std::{
  mem,
  sync::{Arc, Mutex},
};

/// Terminal state a subject records once it has been completed or errored.
#[derive(Clone, Debug, PartialEq)]
pub enum Terminal<Err> {
  Error(Err),
  Completed,
}

type SubjectSlot<Item, Err> = AutoDetachObserver<BoxObserver<Item, Err>>;

struct SubjectCore<Item, Err> {
  observers: Vec<(u64, SubjectSlot<Item, Err>)>,
  next_id: u64,
  terminal: Option<Terminal<Err>>,
}

impl<Item, Err> Default for SubjectCore<Item, Err> {
  fn default() -> Self {
    SubjectCore {
      observers: vec![],
      next_id: 0,
      terminal: None,
    }
  }
}

/// A Subject is both an Observable and an Observer: values pushed into it
/// fan out to every current subscriber.
///
/// Once terminated it stays terminated; a late subscriber gets the stored
/// terminal notification immediately and nothing else.
pub struct Subject<Item, Err> {
  core: Arc<Mutex<SubjectCore<Item, Err>>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject {
      core: Arc::new(Mutex::new(SubjectCore::default())),
    }
  }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  pub fn subscriber_count(&self) -> usize { self.core.lock().unwrap().observers.len() }

  pub fn is_empty(&self) -> bool { self.subscriber_count() == 0 }

  pub fn is_terminated(&self) -> bool { self.core.lock().unwrap().terminal.is_some() }

  fn take_observers(&self) -> Vec<(u64, SubjectSlot<Item, Err>)> {
    mem::take(&mut self.core.lock().unwrap().observers)
  }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    // Snapshot under the lock, deliver outside it: a callback may
    // subscribe or unsubscribe this same subject.
    let slots: SmallVec<[SubjectSlot<Item, Err>; 1]> = {
      let core = self.core.lock().unwrap();
      if core.terminal.is_some() {
        return;
      }
      core.observers.iter().map(|(_, slot)| slot.clone()).collect()
    };

    let mut iter = slots.into_iter().peekable();
    while let Some(mut slot) = iter.next() {
      if iter.peek().is_some() {
        slot.next(value.clone());
      } else {
        slot.next(value);
        break;
      }
    }
  }

  fn error(&mut self, err: Err) {
    let slots = {
      let mut core = self.core.lock().unwrap();
      if core.terminal.is_some() {
        return;
      }
      core.terminal = Some(Terminal::Error(err.clone()));
      mem::take(&mut core.observers)
    };
    for (_, mut slot) in slots {
      slot.error(err.clone());
    }
  }

  fn complete(&mut self) {
    let slots = {
      let mut core = self.core.lock().unwrap();
      if core.terminal.is_some() {
        return;
      }
      core.terminal = Some(Terminal::Completed);
      mem::take(&mut core.observers)
    };
    for (_, mut slot) in slots {
      slot.complete();
    }
  }

  fn is_closed(&self) -> bool { self.is_terminated() }
}

impl<Item, Err> Observable<Item, Err> for Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let slot = {
      let mut core = self.core.lock().unwrap();
      match &core.terminal {
        Some(terminal) => {
          let terminal = terminal.clone();
          drop(core);
          let mut observer = observer;
          match terminal {
            Terminal::Error(err) => observer.error(err),
            Terminal::Completed => observer.complete(),
          }
          return Teardown::closed();
        }
        None => {
          let id = core.next_id;
          core.next_id += 1;
          let slot: SubjectSlot<Item, Err> = AutoDetachObserver::new(Box::new(observer));
          core.observers.push((id, slot.clone()));
          (id, slot)
        }
      }
    };

    let (id, slot) = slot;
    let core = self.core;
    Teardown::new(move || {
      slot.clear();
      core.lock().unwrap().observers.retain(|(i, _)| *i != id);
    })
  }
}

impl<Item, Err> Subscription for Subject<Item, Err> {
  fn unsubscribe(&mut self) {
    for (_, slot) in self.take_observers() {
      slot.clear();
    }
  }

  fn is_closed(&self) -> bool { self.core.lock().unwrap().observers.is_empty() }
}
