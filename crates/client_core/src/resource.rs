//! Async resource controller: one remote operation, its loading/data/error state,
//! and a trigger that (re)runs the operation with call-time arguments.
//!
//! State is stale-while-loading: a trigger flips `loading` to `Some(true)` but
//! keeps the previous `data` and `error` visible until the new call settles.
//! Every trigger runs on its own task, so dropping the returned [`Trigger`]
//! never cancels the call; the outcome is still committed to state.

use std::{
    any::Any,
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use futures::{future::BoxFuture, FutureExt};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::error::OperationError;

/// How a settling call decides whether it may write to state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitPolicy {
    /// Only the most recently issued call commits; superseded results are dropped.
    #[default]
    LatestIssued,
    /// Every call commits when it settles, so the last one to settle wins.
    LastSettled,
}

#[derive(Debug, Clone)]
pub struct AsyncState<T> {
    pub data: Option<T>,
    /// `None` until the first trigger, never `None` afterwards.
    pub loading: Option<bool>,
    pub error: Option<OperationError>,
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: None,
            error: None,
        }
    }
}

impl<T> AsyncState<T> {
    pub fn is_loading(&self) -> bool {
        self.loading == Some(true)
    }

    pub fn has_settled(&self) -> bool {
        self.loading == Some(false)
    }

    pub fn phase(&self) -> Phase<'_, T> {
        match self.loading {
            None => Phase::Idle,
            Some(true) => Phase::Loading,
            Some(false) => match (&self.error, &self.data) {
                (Some(error), _) => Phase::Failed(error),
                (None, Some(data)) => Phase::Ready(data),
                (None, None) => Phase::Idle,
            },
        }
    }
}

/// Render-oriented view of an [`AsyncState`].
#[derive(Debug, PartialEq)]
pub enum Phase<'a, T> {
    Idle,
    Loading,
    Failed(&'a OperationError),
    Ready(&'a T),
}

type Operation<B, A, T> =
    dyn Fn(B, A) -> BoxFuture<'static, Result<T, OperationError>> + Send + Sync;

struct Shared<T> {
    state: watch::Sender<AsyncState<T>>,
    issued: AtomicU64,
}

impl<T: Clone> Shared<T> {
    fn commit(
        &self,
        name: &'static str,
        policy: CommitPolicy,
        ticket: u64,
        outcome: &Result<T, OperationError>,
    ) {
        // The ticket check runs under the state lock so a newer trigger cannot
        // slip its `loading = true` in between the check and the write.
        let committed = self.state.send_if_modified(|state| {
            if policy == CommitPolicy::LatestIssued && self.issued.load(Ordering::SeqCst) != ticket
            {
                return false;
            }
            match outcome {
                Ok(value) => {
                    state.data = Some(value.clone());
                    state.error = None;
                }
                Err(error) => state.error = Some(error.clone()),
            }
            state.loading = Some(false);
            true
        });

        match (committed, outcome) {
            (false, _) => debug!(resource = name, ticket, "discarded superseded result"),
            (true, Ok(_)) => debug!(resource = name, ticket, "operation settled"),
            (true, Err(error)) => warn!(resource = name, ticket, %error, "operation failed"),
        }
    }
}

/// Controller around a single remote operation `op(bound, args)`.
///
/// `B` is fixed at construction (use `()` when the operation needs no scope),
/// `A` is supplied per trigger. Cloning the controller shares its state.
pub struct AsyncResource<B, A, T> {
    name: &'static str,
    bound: B,
    op: Arc<Operation<B, A, T>>,
    policy: CommitPolicy,
    shared: Arc<Shared<T>>,
}

impl<B: Clone, A, T> Clone for AsyncResource<B, A, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            bound: self.bound.clone(),
            op: Arc::clone(&self.op),
            policy: self.policy,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, T> AsyncResource<(), A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut, E>(name: &'static str, op: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<OperationError>,
    {
        Self::with_bound(name, (), move |(), args| op(args))
    }
}

impl<B, A, T> AsyncResource<B, A, T>
where
    B: Clone + Send + Sync + 'static,
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn with_bound<F, Fut, E>(name: &'static str, bound: B, op: F) -> Self
    where
        F: Fn(B, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<OperationError>,
    {
        let op: Arc<Operation<B, A, T>> = Arc::new(
            move |bound: B, args: A| -> BoxFuture<'static, Result<T, OperationError>> {
                let pending = op(bound, args);
                Box::pin(async move { pending.await.map_err(Into::into) })
            },
        );
        let (state, _) = watch::channel(AsyncState::default());
        Self {
            name,
            bound,
            op,
            policy: CommitPolicy::default(),
            shared: Arc::new(Shared {
                state,
                issued: AtomicU64::new(0),
            }),
        }
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn bound(&self) -> &B {
        &self.bound
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Starts the operation. `loading` is `Some(true)` as soon as this returns.
    ///
    /// The call runs on the current Tokio runtime. Without one, the trigger
    /// settles immediately with an error that is committed like any failure.
    pub fn trigger(&self, args: A) -> Trigger<T> {
        let ticket = self.shared.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared
            .state
            .send_modify(|state| state.loading = Some(true));
        debug!(resource = self.name, ticket, "operation triggered");

        let shared = Arc::clone(&self.shared);
        let name = self.name;
        let policy = self.policy;
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                let outcome = Err(OperationError::new(format!(
                    "{name} needs a Tokio runtime: {err}"
                )));
                shared.commit(name, policy, ticket, &outcome);
                return Trigger {
                    name,
                    inner: TriggerInner::Settled(Some(outcome)),
                };
            }
        };

        let pending = (self.op)(self.bound.clone(), args);
        let handle = runtime.spawn(async move {
            let outcome = match AssertUnwindSafe(pending).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(OperationError::new(format!(
                    "{name} panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            };
            shared.commit(name, policy, ticket, &outcome);
            outcome
        });

        Trigger {
            name,
            inner: TriggerInner::Running(handle),
        }
    }

    pub fn state(&self) -> AsyncState<T> {
        self.shared.state.borrow().clone()
    }

    /// Reads state without cloning the payload.
    pub fn with_state<R>(&self, read: impl FnOnce(&AsyncState<T>) -> R) -> R {
        read(&self.shared.state.borrow())
    }

    pub fn loading(&self) -> Option<bool> {
        self.shared.state.borrow().loading
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().is_loading()
    }

    pub fn data(&self) -> Option<T> {
        self.shared.state.borrow().data.clone()
    }

    pub fn error(&self) -> Option<OperationError> {
        self.shared.state.borrow().error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AsyncState<T>> {
        self.shared.state.subscribe()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Handle to an in-flight trigger. Awaiting yields the call's own result, even
/// when a newer call superseded it in state.
#[must_use = "call .detach() to run the operation without awaiting its result"]
pub struct Trigger<T> {
    name: &'static str,
    inner: TriggerInner<T>,
}

enum TriggerInner<T> {
    Running(JoinHandle<Result<T, OperationError>>),
    Settled(Option<Result<T, OperationError>>),
}

impl<T> Trigger<T> {
    pub fn detach(self) {}
}

impl<T> Unpin for Trigger<T> {}

impl<T> Future for Trigger<T> {
    type Output = Result<T, OperationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let name = self.name;
        match &mut self.inner {
            TriggerInner::Running(handle) => match Pin::new(handle).poll(cx) {
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(join_error)) => Poll::Ready(Err(OperationError::new(format!(
                    "{name} task did not complete: {join_error}"
                )))),
                Poll::Pending => Poll::Pending,
            },
            TriggerInner::Settled(outcome) => Poll::Ready(outcome.take().unwrap_or_else(|| {
                Err(OperationError::new(format!("{name} trigger polled after completion")))
            })),
        }
    }
}

#[cfg(test)]
#[path = "tests/resource_tests.rs"]
mod tests;
