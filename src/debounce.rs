//! Debounced execution of the real search routine
//!
//! Delay-until-idle semantics with a max-wait ceiling: a call executes once no
//! new call has arrived within the idle window, but a sustained burst of input
//! never defers execution past the ceiling. Only the most recent call's
//! arguments are used; superseded calls resolve to `None` rather than queue.
use crate::config::DebounceConfig;
use crate::error::Result;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Where the executor currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Pending,
    Executing,
}

type ExecFn<A, T> =
    Arc<dyn Fn(A) -> Pin<Box<dyn Future<Output = Result<T>> + Send>> + Send + Sync>;

struct Shared {
    generation: u64,
    burst_started: Option<Instant>,
    flush_requested: bool,
    cancelled: bool,
    phase: DebouncePhase,
}

pub struct DebouncedSearchExecutor<A, T> {
    exec: ExecFn<A, T>,
    idle_window: Duration,
    max_wait: Duration,
    shared: Mutex<Shared>,
    wake: Notify,
}

enum Decision {
    Execute,
    Discard,
    KeepWaiting,
}

impl<A, T> DebouncedSearchExecutor<A, T> {
    pub fn new(config: &DebounceConfig, exec: ExecFn<A, T>) -> Self {
        Self {
            exec,
            idle_window: config.idle_window(),
            max_wait: config.max_wait(),
            shared: Mutex::new(Shared {
                generation: 0,
                burst_started: None,
                flush_requested: false,
                cancelled: false,
                phase: DebouncePhase::Idle,
            }),
            wake: Notify::new(),
        }
    }

    /// Wrap a plain async function as the downstream executor.
    pub fn wrap<F, Fut>(config: &DebounceConfig, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::new(config, Arc::new(move |args| Box::pin(f(args))))
    }

    /// Submit a call. Resolves `Ok(Some(value))` or the execution error for
    /// the call that survives the window, `Ok(None)` for calls that were
    /// superseded or cancelled before the window elapsed.
    pub async fn call(&self, args: A) -> Result<Option<T>> {
        let (my_gen, deadline) = {
            let mut shared = self.shared.lock();
            shared.generation += 1;
            shared.cancelled = false;
            shared.flush_requested = false;
            shared.phase = DebouncePhase::Pending;

            let now = Instant::now();
            let burst = *shared.burst_started.get_or_insert(now);
            let deadline = (now + self.idle_window).min(burst + self.max_wait);
            (shared.generation, deadline)
        };
        // Let any superseded waiter resolve promptly.
        self.wake.notify_waiters();

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = self.wake.notified() => {}
            }

            let decision = {
                let mut shared = self.shared.lock();
                if shared.generation != my_gen {
                    Decision::Discard
                } else if shared.cancelled {
                    shared.cancelled = false;
                    shared.phase = DebouncePhase::Idle;
                    shared.burst_started = None;
                    Decision::Discard
                } else if shared.flush_requested || Instant::now() >= deadline {
                    shared.flush_requested = false;
                    shared.phase = DebouncePhase::Executing;
                    shared.burst_started = None;
                    Decision::Execute
                } else {
                    Decision::KeepWaiting
                }
            };

            match decision {
                Decision::Discard => return Ok(None),
                Decision::Execute => break,
                Decision::KeepWaiting => continue,
            }
        }

        let result = (self.exec)(args).await;

        {
            let mut shared = self.shared.lock();
            if shared.generation == my_gen {
                shared.phase = DebouncePhase::Idle;
            }
        }

        result.map(Some)
    }

    /// Clear the pending timer without executing. The pending caller resolves
    /// `Ok(None)`.
    pub fn cancel(&self) {
        let mut shared = self.shared.lock();
        if shared.phase == DebouncePhase::Pending {
            shared.cancelled = true;
        }
        drop(shared);
        self.wake.notify_waiters();
    }

    /// Force immediate execution of the pending call, if any.
    pub fn flush(&self) {
        let mut shared = self.shared.lock();
        if shared.phase == DebouncePhase::Pending {
            shared.flush_requested = true;
        }
        drop(shared);
        self.wake.notify_waiters();
    }

    pub fn phase(&self) -> DebouncePhase {
        self.shared.lock().phase
    }
}
