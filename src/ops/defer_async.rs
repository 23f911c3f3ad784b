use crate::{
  cancellation::CancellationToken,
  observable::Observable,
  observer::{AutoDetachObserver, Observer},
  subscription::Subscription,
  type_hint::TypeHint,
};
use futures::executor::ThreadPool;
use once_cell::sync::Lazy;
use std::{
  future::Future,
  sync::{Arc, Mutex},
};

static POOL: Lazy<ThreadPool> = Lazy::new(|| {
  ThreadPool::builder()
    .pool_size(2)
    .create()
    .expect("deferred-factory thread pool failed to start")
});

/// Calls an async `factory` for each subscription and subscribes to the
/// observable it resolves to.
///
/// The factory gets a [`CancellationToken`] tied to the subscription.
/// Unsubscribing cancels the token; a factory still in flight at that point
/// should stop early, and whatever it resolves to afterwards is discarded
/// without being subscribed.
pub fn defer_async<F, Fut, Src, Item, Err>(factory: F) -> DeferAsync<F, Item, Err>
where
  F: Fn(CancellationToken) -> Fut,
  Fut: Future<Output = Result<Src, Err>> + Send + 'static,
  Src: Observable<Item, Err> + Send + 'static,
{
  DeferAsync {
    factory,
    _hint: TypeHint::new(),
  }
}

#[derive(Clone)]
pub struct DeferAsync<F, Item, Err> {
  factory: F,
  _hint: TypeHint<(Item, Err)>,
}

struct DeferAsyncState {
  cancelled: bool,
  inner: Option<Box<dyn Subscription + Send>>,
}

impl<F, Fut, Src, Item, Err> Observable<Item, Err> for DeferAsync<F, Item, Err>
where
  F: Fn(CancellationToken) -> Fut,
  Fut: Future<Output = Result<Src, Err>> + Send + 'static,
  Src: Observable<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Unsub = DeferAsyncSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let token = CancellationToken::new();
    let gate = AutoDetachObserver::new(observer);
    let state = Arc::new(Mutex::new(DeferAsyncState {
      cancelled: false,
      inner: None,
    }));

    let fut = (self.factory)(token.clone());
    let task_token = token.clone();
    let task_gate = gate.clone();
    let task_state = state.clone();
    POOL.spawn_ok(async move {
      let result = fut.await;
      if task_token.is_cancelled() {
        return;
      }
      match result {
        Ok(source) => {
          let upstream = source.actual_subscribe(task_gate);
          let mut state = task_state.lock().unwrap();
          if state.cancelled {
            drop(state);
            let mut upstream = upstream;
            upstream.unsubscribe();
          } else {
            state.inner = Some(Box::new(upstream));
          }
        }
        Err(err) => {
          let mut gate = task_gate;
          gate.error(err);
        }
      }
    });

    DeferAsyncSubscription {
      token,
      gate: Box::new(gate),
      state,
    }
  }
}

/// Unsubscribing cancels the factory's token, detaches the observer and
/// releases the inner subscription if the factory already resolved.
pub struct DeferAsyncSubscription {
  token: CancellationToken,
  gate: Box<dyn Subscription + Send>,
  state: Arc<Mutex<DeferAsyncState>>,
}

impl Subscription for DeferAsyncSubscription {
  fn unsubscribe(&mut self) {
    let inner = {
      let mut state = self.state.lock().unwrap();
      state.cancelled = true;
      state.inner.take()
    };
    self.gate.unsubscribe();
    self.token.cancel();
    if let Some(mut inner) = inner {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.state.lock().unwrap().cancelled }
}
