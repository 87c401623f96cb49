//! Write hooks
//!
//! A [`MutationHook`] runs one server write and then applies the cache
//! effects the write produced. Effects are decided by the action after the
//! server has answered, so nothing is invalidated optimistically.

use crate::cache::{Mutation, QueryCache};
use crate::error::{ClientError, Result};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Result of a write plus the cache invalidations it calls for
#[derive(Debug)]
pub struct Outcome<O> {
    pub result: Result<O>,

    /// Applied in order once the action returns, whether it succeeded or not
    pub effects: Vec<Mutation>,
}

impl<O> Outcome<O> {
    /// Effects from `on_success` when the write succeeded, none otherwise
    pub fn from_result<F>(result: Result<O>, on_success: F) -> Self
    where
        F: FnOnce(&O) -> Vec<Mutation>,
    {
        let effects = match &result {
            Ok(value) => on_success(value),
            Err(_) => Vec::new(),
        };
        Self { result, effects }
    }

    /// A failed write that still needs some keys refreshed
    pub fn failed(error: ClientError, effects: Vec<Mutation>) -> Self {
        Self {
            result: Err(error),
            effects,
        }
    }
}

type Action<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Outcome<O>> + Send + Sync>;

/// Mounted write operation
pub struct MutationHook<I, O> {
    cache: QueryCache,
    action: Action<I, O>,
    pending: AtomicUsize,
    last_error: Mutex<Option<ClientError>>,
}

impl<I, O> fmt::Debug for MutationHook<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationHook")
            .field("pending", &self.pending.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<I, O> MutationHook<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new<F, Fut>(cache: &QueryCache, action: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<O>> + Send + 'static,
    {
        Self {
            cache: cache.clone(),
            action: Arc::new(move |input| action(input).boxed()),
            pending: AtomicUsize::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// Run the write, apply its cache effects, and return its result
    pub async fn mutate(&self, input: I) -> Result<O> {
        let _pending = PendingGuard::enter(&self.pending);

        let Outcome { result, effects } = (self.action)(input).await;

        for effect in &effects {
            let event = self.cache.invalidate_for(effect).await;
            debug!(
                "{:?} invalidated {} keys, refetched {}",
                effect.kind(),
                event.keys.len(),
                event.refetched
            );
        }

        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = result.as_ref().err().cloned();
        result
    }

    /// Whether a call to [`mutate`](Self::mutate) is still running
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Error of the last completed call
    pub fn error(&self) -> Option<ClientError> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Forget the last error
    pub fn reset(&self) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
