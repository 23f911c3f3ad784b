use rxcore::prelude::*;
use rxcore::testing::{HotObservable, Notification, SubscriptionRecord, TestObserver};
use std::sync::{Arc, Mutex};

fn ms(millis: u64) -> Duration { Duration::from_millis(millis) }

fn record(subscribed: u64, unsubscribed: u64) -> SubscriptionRecord {
  SubscriptionRecord {
    subscribed: ms(subscribed),
    unsubscribed: Some(ms(unsubscribed)),
  }
}

/// Values 1..=9 at 210ms..290ms, completion at 300ms.
fn scripted_source(scheduler: &TestScheduler) -> HotObservable<i32, ()> {
  let mut messages: Vec<(Duration, Notification<i32, ()>)> = (1..=9)
    .map(|i| (ms(200 + i * 10), Notification::Next(i as i32)))
    .collect();
  messages.push((ms(300), Notification::Complete));
  HotObservable::new(scheduler.clone(), messages)
}

type Slot = Arc<Mutex<Option<Box<dyn Subscription + Send>>>>;

fn subscribe_window<S>(
  scheduler: &TestScheduler,
  shared: &S,
  from: u64,
  until: u64,
) -> TestObserver<i32, ()>
where
  S: Observable<i32, ()> + Clone + Send + 'static,
{
  let observer = TestObserver::new(scheduler.clone());
  let slot: Slot = Arc::new(Mutex::new(None));

  let source = shared.clone();
  let o = observer.clone();
  let s = slot.clone();
  scheduler.schedule_at(
    ms(from),
    Box::new(move || {
      *s.lock().unwrap() = Some(Box::new(source.subscribe_with(o)));
    }),
  );
  scheduler.schedule_at(
    ms(until),
    Box::new(move || {
      if let Some(mut sub) = slot.lock().unwrap().take() {
        sub.unsubscribe();
      }
    }),
  );
  observer
}

#[test]
fn ref_count_connects_while_any_window_is_open() {
  let scheduler = TestScheduler::new();
  let hot = scripted_source(&scheduler);
  let shared = hot.clone().publish().ref_count();

  let o1 = subscribe_window(&scheduler, &shared, 215, 235);
  let o2 = subscribe_window(&scheduler, &shared, 225, 275);
  let o3 = subscribe_window(&scheduler, &shared, 255, 265);
  let o4 = subscribe_window(&scheduler, &shared, 285, 320);

  scheduler.advance_to(ms(1000));

  assert_eq!(
    o1.messages(),
    vec![
      (ms(220), Notification::Next(2)),
      (ms(230), Notification::Next(3)),
    ]
  );
  assert_eq!(
    o2.messages(),
    vec![
      (ms(230), Notification::Next(3)),
      (ms(240), Notification::Next(4)),
      (ms(250), Notification::Next(5)),
      (ms(260), Notification::Next(6)),
      (ms(270), Notification::Next(7)),
    ]
  );
  assert_eq!(o3.messages(), vec![(ms(260), Notification::Next(6))]);
  assert_eq!(
    o4.messages(),
    vec![
      (ms(290), Notification::Next(9)),
      (ms(300), Notification::Complete),
    ]
  );

  // Upstream was held from the first subscriber to the last, then again
  // for the late subscriber until the source completed.
  assert_eq!(
    hot.subscriptions(),
    vec![record(215, 275), record(285, 300)]
  );
}

#[test]
fn delayed_ref_count_stretches_the_upstream_window() {
  let scheduler = TestScheduler::new();
  let hot = scripted_source(&scheduler);
  let shared = hot
    .clone()
    .publish()
    .ref_count_delayed(ms(9), Arc::new(scheduler.clone()));

  let o1 = subscribe_window(&scheduler, &shared, 215, 235);
  let o2 = subscribe_window(&scheduler, &shared, 225, 275);
  let o3 = subscribe_window(&scheduler, &shared, 255, 265);
  let o4 = subscribe_window(&scheduler, &shared, 285, 320);

  scheduler.advance_to(ms(1000));

  assert_eq!(
    o1.messages(),
    vec![
      (ms(220), Notification::Next(2)),
      (ms(230), Notification::Next(3)),
    ]
  );
  assert_eq!(
    o2.messages(),
    vec![
      (ms(230), Notification::Next(3)),
      (ms(240), Notification::Next(4)),
      (ms(250), Notification::Next(5)),
      (ms(260), Notification::Next(6)),
      (ms(270), Notification::Next(7)),
    ]
  );
  assert_eq!(o3.messages(), vec![(ms(260), Notification::Next(6))]);
  assert_eq!(
    o4.messages(),
    vec![
      (ms(290), Notification::Next(9)),
      (ms(300), Notification::Complete),
    ]
  );

  // The last window closed at 275; the grace period kept the upstream
  // alive until 284, and the 285 subscriber opened a fresh connection.
  assert_eq!(
    hot.subscriptions(),
    vec![record(215, 284), record(285, 300)]
  );
}

#[test]
fn error_reaches_every_subscriber_and_ends_the_upstream_window() {
  let scheduler = TestScheduler::new();
  let hot: HotObservable<i32, &str> = HotObservable::new(
    scheduler.clone(),
    vec![
      (ms(10), Notification::Next(1)),
      (ms(20), Notification::Error("boom")),
      (ms(30), Notification::Next(2)),
    ],
  );
  let shared = hot.clone().publish().ref_count();

  let first = TestObserver::new(scheduler.clone());
  let second = TestObserver::new(scheduler.clone());
  let _s1 = shared.clone().subscribe_with(first.clone());
  let _s2 = shared.subscribe_with(second.clone());
  scheduler.advance_to(ms(100));

  let expected = vec![
    (ms(10), Notification::Next(1)),
    (ms(20), Notification::Error("boom")),
  ];
  assert_eq!(first.messages(), expected);
  assert_eq!(second.messages(), expected);
  assert_eq!(hot.subscriptions(), vec![record(0, 20)]);
}

#[test]
fn second_subscriber_shares_instead_of_resubscribing() {
  let scheduler = TestScheduler::new();
  let hot = scripted_source(&scheduler);
  let shared = hot.clone().publish().ref_count();

  let o1 = subscribe_window(&scheduler, &shared, 205, 400);
  let o2 = subscribe_window(&scheduler, &shared, 205, 400);

  scheduler.advance_to(ms(1000));

  assert_eq!(o1.messages().len(), 10);
  assert_eq!(o1.messages(), o2.messages());
  assert_eq!(hot.subscriptions(), vec![record(205, 300)]);
}
