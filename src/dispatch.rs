//! Rate-limited retry dispatcher
//!
//! Every transport call goes through here. The dispatcher owns one
//! concurrency queue per transport kind and wraps each call in a bounded
//! retry loop:
//! - Queue admission is FIFO; at most the ceiling of tasks execute at once.
//! - The admission permit is held across retries, so a retrying task reuses
//!   its slot instead of re-entering the queue.
//! - Only retryable (transport) errors are retried; parse errors propagate
//!   immediately. After the final attempt the last error propagates
//!   unwrapped.

use crate::report::Reporter;
use crate::{ClientConfig, Result, WikidotError};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Retry delays double per attempt but never exceed this
const MAX_BACKOFF: Duration = Duration::from_secs(4);

/// Which transport queue a call is admitted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Structured XML-RPC call
    Rpc,
    /// AJAX module call
    Ajax,
}

impl TransportKind {
    /// Label used for attempt reporting
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Rpc => "rpcCall",
            TransportKind::Ajax => "ajaxCall",
        }
    }
}

/// A single call to be dispatched, immutable once issued
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Queue the call is admitted to
    pub kind: TransportKind,
    /// Method name for structured calls, wiki base URL for AJAX calls
    pub target: String,
    /// Argument record passed to the transport
    pub args: Value,
}

impl CallRequest {
    pub fn new(kind: TransportKind, target: impl Into<String>, args: Value) -> Self {
        Self {
            kind,
            target: target.into(),
            args,
        }
    }
}

/// Bounded-concurrency queues plus retry policy, owned by a client instance
pub struct Dispatcher {
    rpc_slots: Arc<Semaphore>,
    ajax_slots: Arc<Semaphore>,
    retries: u32,
    base_delay: Duration,
    reporter: Arc<dyn Reporter>,
}

impl Dispatcher {
    /// Creates a dispatcher with the configured ceilings and retry policy
    pub fn new(config: &ClientConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            rpc_slots: Arc::new(Semaphore::new(config.rpc_concurrency)),
            ajax_slots: Arc::new(Semaphore::new(config.ajax_concurrency)),
            retries: config.retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            reporter,
        }
    }

    /// Replaces the attached reporter
    pub fn set_reporter(&mut self, reporter: Arc<dyn Reporter>) {
        self.reporter = reporter;
    }

    /// Dispatches one call through its transport queue
    ///
    /// `op` produces a fresh transport future per attempt. The call settles
    /// with the first success, with the first non-retryable error, or with
    /// the last error once all attempts are spent.
    pub async fn dispatch<T, F, Fut>(&self, request: CallRequest, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slots = match request.kind {
            TransportKind::Rpc => &self.rpc_slots,
            TransportKind::Ajax => &self.ajax_slots,
        };

        // Held until settlement; retries reuse the slot
        let _permit = slots
            .acquire()
            .await
            .map_err(|_| WikidotError::QueueClosed)?;

        let payload = json!({ "target": request.target, "args": request.args });
        let label = request.kind.as_str();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.reporter.report(label, None, Some(&payload));
            tracing::debug!(
                "{} attempt {} for {}",
                label,
                attempt,
                request.target
            );

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt <= self.retries => {
                    tracing::debug!(
                        "{} attempt {} for {} failed: {}",
                        label,
                        attempt,
                        request.target,
                        err
                    );
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Delay before the attempt after `attempt` failures
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        std::cmp::min(self.base_delay * 2u32.pow(exp), MAX_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoopReporter;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn test_dispatcher(rpc: usize, ajax: usize, retries: u32) -> Dispatcher {
        let config = ClientConfig {
            rpc_concurrency: rpc,
            ajax_concurrency: ajax,
            retries,
            retry_base_delay_ms: 1,
            request_timeout_secs: 30,
        };
        Dispatcher::new(&config, Arc::new(NoopReporter))
    }

    fn ajax_request() -> CallRequest {
        CallRequest::new(TransportKind::Ajax, "http://example.com/", json!({}))
    }

    fn rpc_request() -> CallRequest {
        CallRequest::new(TransportKind::Rpc, "pages.select", json!({"site": "test"}))
    }

    struct CountingReporter(Arc<AtomicUsize>);

    impl Reporter for CountingReporter {
        fn report(&self, _message: &str, _tag: Option<&str>, _payload: Option<&Value>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_executing_tasks_never_exceed_ceiling() {
        let dispatcher = Arc::new(test_dispatcher(4, 2, 0));
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let calls = (0..6).map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            let current = Arc::clone(&current);
            let max_seen = Arc::clone(&max_seen);
            async move {
                dispatcher
                    .dispatch(ajax_request(), move || {
                        let current = Arc::clone(&current);
                        let max_seen = Arc::clone(&max_seen);
                        async move {
                            let executing = current.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(executing, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            current.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        }
                    })
                    .await
            }
        });

        let results: Vec<Result<()>> = futures::future::join_all(calls).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(max_seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queues_are_independent() {
        let dispatcher = Arc::new(test_dispatcher(1, 1, 0));
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let make_call = |request: CallRequest| {
            let dispatcher = Arc::clone(&dispatcher);
            let current = Arc::clone(&current);
            let max_seen = Arc::clone(&max_seen);
            async move {
                dispatcher
                    .dispatch(request, move || {
                        let current = Arc::clone(&current);
                        let max_seen = Arc::clone(&max_seen);
                        async move {
                            let executing = current.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(executing, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            current.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        }
                    })
                    .await
            }
        };

        let (rpc, ajax): (Result<()>, Result<()>) =
            tokio::join!(make_call(rpc_request()), make_call(ajax_request()));
        assert!(rpc.is_ok() && ajax.is_ok());

        // One slot per queue, but the queues do not contend with each other
        assert_eq!(max_seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_admission_with_single_slot() {
        let dispatcher = Arc::new(test_dispatcher(4, 1, 0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let calls = (0..4usize).map(|index| {
            let dispatcher = Arc::clone(&dispatcher);
            let order = Arc::clone(&order);
            async move {
                dispatcher
                    .dispatch(ajax_request(), move || {
                        let order = Arc::clone(&order);
                        async move {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            order.lock().unwrap().push(index);
                            Ok(())
                        }
                    })
                    .await
            }
        });

        let results: Vec<Result<()>> = futures::future::join_all(calls).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_call_spends_all_attempts() {
        let dispatcher = test_dispatcher(1, 1, 4);
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<()> = dispatcher
            .dispatch(ajax_request(), {
                let attempts = Arc::clone(&attempts);
                move || {
                    let attempts = Arc::clone(&attempts);
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err(WikidotError::Service {
                            status: "try_again".to_string(),
                            message: String::new(),
                        })
                    }
                }
            })
            .await;

        // Initial attempt plus 4 retries, rejection carries the last error
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        match result {
            Err(WikidotError::Service { status, .. }) => assert_eq!(status, "try_again"),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_later_attempt_stops_retrying() {
        let dispatcher = test_dispatcher(1, 1, 4);
        let attempts = Arc::new(AtomicU32::new(0));

        let result = dispatcher
            .dispatch(ajax_request(), {
                let attempts = Arc::clone(&attempts);
                move || {
                    let attempts = Arc::clone(&attempts);
                    async move {
                        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                        if attempt < 3 {
                            Err(WikidotError::Service {
                                status: "try_again".to_string(),
                                message: String::new(),
                            })
                        } else {
                            Ok(attempt)
                        }
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parse_errors_are_not_retried() {
        let dispatcher = test_dispatcher(1, 1, 4);
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<()> = dispatcher
            .dispatch(ajax_request(), {
                let attempts = Arc::clone(&attempts);
                move || {
                    let attempts = Arc::clone(&attempts);
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err(WikidotError::Parse("pager missing".to_string()))
                    }
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(WikidotError::Parse(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_is_reported_with_parameters() {
        let reports = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = test_dispatcher(1, 1, 2);
        dispatcher.set_reporter(Arc::new(CountingReporter(Arc::clone(&reports))));

        let result: Result<()> = dispatcher
            .dispatch(rpc_request(), || async {
                Err(WikidotError::Rpc("boom".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(reports.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let dispatcher = test_dispatcher(1, 1, 4);
        assert_eq!(dispatcher.backoff(1), Duration::from_millis(1));
        assert_eq!(dispatcher.backoff(2), Duration::from_millis(2));
        assert_eq!(dispatcher.backoff(3), Duration::from_millis(4));

        let slow = Dispatcher::new(&ClientConfig::default(), Arc::new(NoopReporter));
        assert_eq!(slow.backoff(1), Duration::from_millis(250));
        assert_eq!(slow.backoff(5), MAX_BACKOFF);
    }
}
