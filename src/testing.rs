//! Virtual-time recording helpers for exercising observables in tests.

use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::{test_scheduler::TestScheduler, Duration, Scheduler},
  subject::Subject,
  subscription::{Subscription, Teardown},
};
use std::sync::{Arc, Mutex};

/// One notification as a plain value, for recording and comparing.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

/// Observer that records every notification with the virtual time it
/// arrived at.
pub struct TestObserver<Item, Err> {
  scheduler: TestScheduler,
  messages: Arc<Mutex<Vec<(Duration, Notification<Item, Err>)>>>,
}

impl<Item, Err> Clone for TestObserver<Item, Err> {
  fn clone(&self) -> Self {
    TestObserver {
      scheduler: self.scheduler.clone(),
      messages: self.messages.clone(),
    }
  }
}

impl<Item, Err> TestObserver<Item, Err> {
  pub fn new(scheduler: TestScheduler) -> Self {
    TestObserver {
      scheduler,
      messages: Arc::new(Mutex::new(vec![])),
    }
  }

  pub fn messages(&self) -> Vec<(Duration, Notification<Item, Err>)>
  where
    Item: Clone,
    Err: Clone,
  {
    self.messages.lock().unwrap().clone()
  }
}

impl<Item, Err> Observer<Item, Err> for TestObserver<Item, Err> {
  fn next(&mut self, value: Item) {
    let at = self.scheduler.now();
    self.messages.lock().unwrap().push((at, Notification::Next(value)));
  }

  fn error(&mut self, err: Err) {
    let at = self.scheduler.now();
    self.messages.lock().unwrap().push((at, Notification::Error(err)));
  }

  fn complete(&mut self) {
    let at = self.scheduler.now();
    self.messages.lock().unwrap().push((at, Notification::Complete));
  }

  // Records unconditionally so a test can see even misbehaving sources.
  fn is_closed(&self) -> bool { false }
}

/// The virtual-time window one subscription to a [`HotObservable`] covered.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionRecord {
  pub subscribed: Duration,
  pub unsubscribed: Option<Duration>,
}

/// A source that plays a scripted message sequence on the virtual clock
/// whether or not anyone is subscribed, and records every subscription
/// window.
///
/// A terminal message closes the windows of all live subscriptions at its
/// own instant, matching how a finished source releases its observers.
pub struct HotObservable<Item, Err> {
  scheduler: TestScheduler,
  subject: Subject<Item, Err>,
  subscriptions: Arc<Mutex<Vec<SubscriptionRecord>>>,
}

impl<Item, Err> Clone for HotObservable<Item, Err> {
  fn clone(&self) -> Self {
    HotObservable {
      scheduler: self.scheduler.clone(),
      subject: self.subject.clone(),
      subscriptions: self.subscriptions.clone(),
    }
  }
}

impl<Item, Err> HotObservable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(
    scheduler: TestScheduler,
    messages: Vec<(Duration, Notification<Item, Err>)>,
  ) -> Self {
    let hot = HotObservable {
      scheduler: scheduler.clone(),
      subject: Subject::new(),
      subscriptions: Arc::new(Mutex::new(vec![])),
    };
    for (at, message) in messages {
      let mut subject = hot.subject.clone();
      let subscriptions = hot.subscriptions.clone();
      let clock = scheduler.clone();
      scheduler.schedule_at(
        at,
        Box::new(move || match message {
          Notification::Next(value) => subject.next(value),
          Notification::Error(err) => {
            close_open_records(&subscriptions, clock.now());
            subject.error(err)
          }
          Notification::Complete => {
            close_open_records(&subscriptions, clock.now());
            subject.complete()
          }
        }),
      );
    }
    hot
  }

  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> {
    self.subscriptions.lock().unwrap().clone()
  }
}

fn close_open_records(records: &Arc<Mutex<Vec<SubscriptionRecord>>>, at: Duration) {
  for record in records.lock().unwrap().iter_mut() {
    if record.unsubscribed.is_none() {
      record.unsubscribed = Some(at);
    }
  }
}

impl<Item, Err> Observable<Item, Err> for HotObservable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let now = self.scheduler.now();
    // A subscriber arriving after the terminal played only gets the
    // replayed terminal, so its window opens and closes at this instant.
    let already_done = self.subject.is_terminated();
    let index = {
      let mut records = self.subscriptions.lock().unwrap();
      records.push(SubscriptionRecord {
        subscribed: now,
        unsubscribed: if already_done { Some(now) } else { None },
      });
      records.len() - 1
    };

    let mut inner = self.subject.actual_subscribe(observer);
    let records = self.subscriptions;
    let clock = self.scheduler;
    Teardown::new(move || {
      let record = &mut records.lock().unwrap()[index];
      if record.unsubscribed.is_none() {
        record.unsubscribed = Some(clock.now());
      }
      inner.unsubscribe();
    })
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn ms(millis: u64) -> Duration { Duration::from_millis(millis) }

  #[test]
  fn subscriber_sees_only_messages_inside_its_window() {
    let scheduler = TestScheduler::new();
    let hot = HotObservable::new(
      scheduler.clone(),
      vec![
        (ms(10), Notification::Next(1)),
        (ms(20), Notification::Next(2)),
        (ms(30), Notification::<i32, ()>::Next(3)),
      ],
    );

    scheduler.advance_to(ms(15));
    let observer = TestObserver::new(scheduler.clone());
    let mut sub = hot.clone().subscribe_with(observer.clone());

    scheduler.advance_to(ms(25));
    sub.unsubscribe();
    scheduler.advance_to(ms(40));

    assert_eq!(observer.messages(), vec![(ms(20), Notification::Next(2))]);
    assert_eq!(
      hot.subscriptions(),
      vec![SubscriptionRecord {
        subscribed: ms(15),
        unsubscribed: Some(ms(25)),
      }]
    );
  }

  #[test]
  fn subscriber_after_terminal_records_an_already_closed_window() {
    let scheduler = TestScheduler::new();
    let hot = HotObservable::new(
      scheduler.clone(),
      vec![(ms(10), Notification::<i32, ()>::Complete)],
    );
    scheduler.advance_to(ms(40));

    let observer = TestObserver::new(scheduler.clone());
    let _sub = hot.clone().subscribe_with(observer.clone());

    assert_eq!(observer.messages(), vec![(ms(40), Notification::Complete)]);
    assert_eq!(
      hot.subscriptions(),
      vec![SubscriptionRecord {
        subscribed: ms(40),
        unsubscribed: Some(ms(40)),
      }]
    );
  }

  #[test]
  fn terminal_closes_live_subscription_windows() {
    let scheduler = TestScheduler::new();
    let hot = HotObservable::new(
      scheduler.clone(),
      vec![
        (ms(10), Notification::<i32, ()>::Next(1)),
        (ms(30), Notification::Complete),
      ],
    );

    let observer = TestObserver::new(scheduler.clone());
    let _sub = hot.clone().subscribe_with(observer.clone());
    scheduler.advance_to(ms(50));

    assert_eq!(
      observer.messages(),
      vec![
        (ms(10), Notification::Next(1)),
        (ms(30), Notification::Complete),
      ]
    );
    assert_eq!(
      hot.subscriptions(),
      vec![SubscriptionRecord {
        subscribed: ms(0),
        unsubscribed: Some(ms(30)),
      }]
    );
  }
}
