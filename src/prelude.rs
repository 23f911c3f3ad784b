pub use crate::cancellation::CancellationToken;
pub use crate::observable;
pub use crate::observable::{
  create, defer, empty, of, throw, ConnectableObservable, ConnectionHandle, Observable,
};
pub use crate::observer::{AllObserver, AutoDetachObserver, BoxObserver, FnMutObserver, Observer};
pub use crate::ops::{defer_async, DeferAsync, RefCount};
pub use crate::scheduler::{test_scheduler::TestScheduler, Duration, Scheduler, TaskHandle};
pub use crate::subject::{Subject, Terminal};
pub use crate::subscription::{
  CompositeSubscription, Subscription, SubscriptionGuard, Teardown,
};
