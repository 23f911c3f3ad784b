use std::{
  future::Future,
  pin::Pin,
  sync::{Arc, Mutex},
  task::{Context, Poll, Waker},
};

type Callback = Box<dyn FnOnce() + Send>;

struct TokenState {
  cancelled: bool,
  callbacks: Vec<Callback>,
}

/// Cooperative cancellation signal shared between the party requesting the
/// cancel and the work observing it.
///
/// Clones share state. `cancel` latches: it runs the registered callbacks
/// exactly once, and callbacks registered afterwards run immediately.
#[derive(Clone)]
pub struct CancellationToken {
  inner: Arc<Mutex<TokenState>>,
}

impl Default for CancellationToken {
  fn default() -> Self {
    CancellationToken {
      inner: Arc::new(Mutex::new(TokenState {
        cancelled: false,
        callbacks: vec![],
      })),
    }
  }
}

impl CancellationToken {
  pub fn new() -> Self { Self::default() }

  pub fn is_cancelled(&self) -> bool { self.inner.lock().unwrap().cancelled }

  /// Latch the token. Only the first call runs callbacks; they run outside
  /// the lock so a callback may use the token.
  pub fn cancel(&self) {
    let callbacks = {
      let mut state = self.inner.lock().unwrap();
      if state.cancelled {
        return;
      }
      state.cancelled = true;
      std::mem::take(&mut state.callbacks)
    };
    for callback in callbacks {
      callback();
    }
  }

  /// Register a callback to run on cancellation. Runs synchronously right
  /// away if the token is already cancelled.
  pub fn on_cancel<F: FnOnce() + Send + 'static>(&self, callback: F) {
    {
      let mut state = self.inner.lock().unwrap();
      if !state.cancelled {
        state.callbacks.push(Box::new(callback));
        return;
      }
    }
    callback();
  }

  /// A future that resolves once the token is cancelled.
  pub fn cancelled(&self) -> Cancelled {
    Cancelled {
      token: self.clone(),
      waker: Arc::new(Mutex::new(None)),
      registered: false,
    }
  }
}

pub struct Cancelled {
  token: CancellationToken,
  waker: Arc<Mutex<Option<Waker>>>,
  registered: bool,
}

impl Future for Cancelled {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    if this.token.is_cancelled() {
      return Poll::Ready(());
    }
    // Re-polls replace the stored waker; only one token callback is ever
    // registered per future.
    *this.waker.lock().unwrap() = Some(cx.waker().clone());
    if !this.registered {
      this.registered = true;
      let waker = this.waker.clone();
      this.token.on_cancel(move || {
        if let Some(waker) = waker.lock().unwrap().take() {
          waker.wake();
        }
      });
    }
    if this.token.is_cancelled() {
      Poll::Ready(())
    } else {
      Poll::Pending
    }
  }
}
