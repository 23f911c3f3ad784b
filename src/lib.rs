//! Subscription, multicast and virtual-time scheduling substrate for
//! reactive streams.
//!
//! The building blocks: [`observable::Observable`] and
//! [`observer::Observer`] for push-based delivery,
//! [`subscription::Subscription`] for cancellation,
//! [`subject::Subject`] for fan-out, and
//! [`observable::ConnectableObservable`] with
//! [`ops::RefCount`] for sharing one upstream among many subscribers.
//! [`scheduler::test_scheduler::TestScheduler`] runs all of it on a
//! virtual clock so timing-sensitive behavior can be pinned down in
//! deterministic tests.
//!
//! ```
//! use rxcore::prelude::*;
//!
//! let subject: Subject<i32, ()> = Subject::new();
//! let mut sub = subject.clone().subscribe(|v| println!("got {v}"));
//!
//! let mut input = subject.clone();
//! input.next(1);
//! input.next(2);
//! sub.unsubscribe();
//! input.next(3); // not delivered
//! ```

pub mod cancellation;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subject;
pub mod subscription;
pub mod testing;
pub mod type_hint;
