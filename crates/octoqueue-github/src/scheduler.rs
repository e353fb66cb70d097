//! Serialized request dispatch against a shared quota.
//!
//! Every request made through a client goes through one worker task that
//! owns the [`QuotaState`]:
//!
//! 1. Wait for work when the queue is empty.
//! 2. Skip the head if its caller cancelled it.
//! 3. If the quota is exhausted, sleep until the window resets, then check
//!    again. A cancelled or dropped handle wakes the worker early so the
//!    request settles without waiting out the window.
//! 4. Send the head. A rate-limited request goes back to the front of the
//!    queue; anything else is handed back to its caller.
//!
//! Only one request is ever in flight, so the quota needs no locking: the
//! worker is its single writer and callers only see published snapshots.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{Notify, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::quota::QuotaState;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::transport::{Dispatch, Transport};

/// Shortest deferral after a rate-limit rejection, so a reset time that has
/// already passed on our clock cannot cause a tight retry loop.
const MIN_RATE_LIMIT_WAIT: Duration = Duration::from_secs(1);

/// Identifier assigned to each enqueued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to do with queued requests on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Stop accepting requests but dispatch everything already queued.
    Drain,
    /// Settle everything still queued with [`Error::Shutdown`].
    Cancel,
}

/// Caller's side of an enqueued request.
///
/// Dropping the handle before the request settles counts as cancelling it.
#[derive(Debug)]
pub struct RequestHandle {
    id: RequestId,
    cancel: CancelSignal,
    receiver: oneshot::Receiver<Result<ApiResponse>>,
}

/// Cancellation flag shared with the worker, plus a way to wake it.
#[derive(Debug)]
struct CancelSignal {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    settled: bool,
}

impl CancelSignal {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.wake.notify_one();
    }
}

impl Drop for CancelSignal {
    fn drop(&mut self) {
        if !self.settled {
            self.wake.notify_one();
        }
    }
}

impl RequestHandle {
    /// Identifier of the request.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Ask the scheduler not to dispatch this request.
    ///
    /// Has no effect once the request has been sent. A cancelled request
    /// settles with [`Error::Cancelled`], also while the worker is waiting
    /// for an exhausted window to reset.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the request to settle.
    ///
    /// # Errors
    /// Returns the request's terminal error, [`Error::Cancelled`] or
    /// [`Error::Shutdown`].
    pub async fn wait(self) -> Result<ApiResponse> {
        let Self {
            receiver,
            mut cancel,
            ..
        } = self;
        let result = receiver.await.unwrap_or(Err(Error::Shutdown));
        cancel.settled = true;
        result
    }
}

/// A request owned by the worker until it settles.
struct QueuedRequest {
    id: RequestId,
    descriptor: RequestDescriptor,
    responder: oneshot::Sender<Result<ApiResponse>>,
    cancelled: Arc<AtomicBool>,
}

impl QueuedRequest {
    /// Cancelled explicitly, or the caller stopped waiting.
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.responder.is_closed()
    }

    fn settle(self, result: Result<ApiResponse>) {
        // The caller may have dropped its handle
        let _ = self.responder.send(result);
    }
}

enum Command {
    Enqueue(QueuedRequest),
    Shutdown {
        mode: ShutdownMode,
        done: oneshot::Sender<()>,
    },
}

/// FIFO queue with a single dispatch worker.
#[derive(Debug)]
pub struct RequestScheduler {
    commands: mpsc::UnboundedSender<Command>,
    quota: watch::Receiver<QuotaState>,
    wake: Arc<Notify>,
    next_id: AtomicU64,
}

impl RequestScheduler {
    /// Start a worker on the current Tokio runtime.
    ///
    /// `reset_margin` is added to every reset time before the window is
    /// trusted to be open again.
    ///
    /// # Errors
    /// Returns [`Error::NoRuntime`] outside of a Tokio runtime.
    pub fn spawn<T: Transport>(
        transport: T,
        clock: Arc<dyn Clock>,
        reset_margin: Duration,
    ) -> Result<Self> {
        Self::spawn_with_quota(transport, clock, reset_margin, QuotaState::default())
    }

    /// Start a worker with a known initial quota window.
    ///
    /// # Errors
    /// Returns [`Error::NoRuntime`] outside of a Tokio runtime.
    pub fn spawn_with_quota<T: Transport>(
        transport: T,
        clock: Arc<dyn Clock>,
        reset_margin: Duration,
        quota: QuotaState,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (quota_tx, quota_rx) = watch::channel(quota.clone());
        let wake = Arc::new(Notify::new());

        let worker = Worker {
            transport,
            clock,
            reset_margin,
            commands: commands_rx,
            queue: VecDeque::new(),
            quota,
            quota_tx,
            wake: Arc::clone(&wake),
            closed: false,
            stopped: false,
            shutdown_waiters: Vec::new(),
        };
        runtime.spawn(worker.run());

        Ok(Self {
            commands: commands_tx,
            quota: quota_rx,
            wake,
            next_id: AtomicU64::new(1),
        })
    }

    /// Queue a request behind everything already queued.
    ///
    /// # Errors
    /// Returns [`Error::SchedulerClosed`] after shutdown.
    pub fn enqueue(&self, descriptor: RequestDescriptor) -> Result<RequestHandle> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancelled = Arc::new(AtomicBool::new(false));
        let (responder, receiver) = oneshot::channel();

        let request = QueuedRequest {
            id,
            descriptor,
            responder,
            cancelled: Arc::clone(&cancelled),
        };
        self.commands
            .send(Command::Enqueue(request))
            .map_err(|_| Error::SchedulerClosed)?;

        Ok(RequestHandle {
            id,
            cancel: CancelSignal {
                cancelled,
                wake: Arc::clone(&self.wake),
                settled: false,
            },
            receiver,
        })
    }

    /// Queue a request and wait for it to settle.
    ///
    /// # Errors
    /// Returns the request's terminal error.
    pub async fn submit(&self, descriptor: RequestDescriptor) -> Result<ApiResponse> {
        self.enqueue(descriptor)?.wait().await
    }

    /// Latest quota snapshot published by the worker.
    #[must_use]
    pub fn quota(&self) -> QuotaState {
        self.quota.borrow().clone()
    }

    /// Stop the worker and wait until it has exited.
    ///
    /// Calling this more than once, or after the worker stopped, returns
    /// immediately.
    pub async fn shutdown(&self, mode: ShutdownMode) {
        let (done, finished) = oneshot::channel();
        if self.commands.send(Command::Shutdown { mode, done }).is_ok() {
            // Err means the worker already exited
            let _ = finished.await;
        }
    }
}

struct Worker<T> {
    transport: T,
    clock: Arc<dyn Clock>,
    reset_margin: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    queue: VecDeque<QueuedRequest>,
    quota: QuotaState,
    quota_tx: watch::Sender<QuotaState>,
    /// Signalled when a caller cancels or drops a pending request.
    wake: Arc<Notify>,
    /// No more commands will arrive.
    closed: bool,
    /// Exit without dispatching anything else.
    stopped: bool,
    shutdown_waiters: Vec<oneshot::Sender<()>>,
}

impl<T: Transport> Worker<T> {
    async fn run(mut self) {
        debug!("request scheduler started");

        loop {
            self.absorb_pending();
            if self.stopped {
                break;
            }

            let Some(head) = self.queue.front() else {
                if self.closed {
                    break;
                }
                match self.commands.recv().await {
                    Some(command) => self.handle(command),
                    None => self.closed = true,
                }
                continue;
            };

            if head.is_cancelled() {
                if let Some(request) = self.queue.pop_front() {
                    debug!(id = %request.id, "skipping cancelled request");
                    request.settle(Err(Error::Cancelled));
                }
                continue;
            }

            let now = self.clock.now();
            if self.quota.roll_over(now, self.reset_margin) {
                info!(resource = %self.quota.resource, "rate limit window reset");
                self.publish_quota();
            }

            if !self.quota.can_dispatch_now() {
                self.wait_for_reset().await;
                continue;
            }

            if let Some(request) = self.queue.pop_front() {
                self.dispatch(request).await;
            }
        }

        debug!("request scheduler stopped");
        for waiter in self.shutdown_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Sleep until the quota window should be open, while still accepting
    /// new requests and shutdown.
    async fn wait_for_reset(&mut self) {
        let wait = self.quota.time_until_reset(self.clock.now()) + self.reset_margin;
        warn!(
            wait_secs = wait.as_secs_f64(),
            queued = self.queue.len(),
            reset_at = %self.quota.reset_at,
            "rate limit exhausted, deferring dispatch"
        );

        let wake = Arc::clone(&self.wake);
        if self.closed {
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = wake.notified() => self.sweep_cancelled(),
            }
            return;
        }

        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            () = wake.notified() => self.sweep_cancelled(),
            command = self.commands.recv() => match command {
                Some(command) => self.handle(command),
                None => self.closed = true,
            },
        }
    }

    /// Settle every cancelled request in the queue, wherever it sits.
    fn sweep_cancelled(&mut self) {
        let (cancelled, pending): (VecDeque<_>, VecDeque<_>) = self
            .queue
            .drain(..)
            .partition(QueuedRequest::is_cancelled);
        self.queue = pending;

        for request in cancelled {
            debug!(id = %request.id, "skipping cancelled request");
            request.settle(Err(Error::Cancelled));
        }
    }

    async fn dispatch(&mut self, request: QueuedRequest) {
        debug!(
            id = %request.id,
            method = %request.descriptor.method(),
            path = request.descriptor.path(),
            remaining = self.quota.remaining,
            "dispatching request"
        );

        let now = self.clock.now();
        let outcome = self
            .transport
            .send(&request.descriptor, &mut self.quota, now)
            .await;

        match outcome {
            Dispatch::RateLimited { retry_after } => {
                let retry_after = retry_after.max(MIN_RATE_LIMIT_WAIT);
                self.quota.exhaust(self.clock.now(), retry_after);
                warn!(
                    id = %request.id,
                    retry_after_secs = retry_after.as_secs_f64(),
                    "rate limited, request requeued at the front"
                );
                self.queue.push_front(request);
            }
            Dispatch::Settled(result) => {
                if let Err(error) = &result {
                    debug!(id = %request.id, %error, "request failed");
                }
                request.settle(result);
            }
        }

        self.publish_quota();
    }

    /// Move any commands already waiting in the channel onto the queue.
    fn absorb_pending(&mut self) {
        while !self.closed {
            match self.commands.try_recv() {
                Ok(command) => self.handle(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.closed = true,
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Enqueue(request) => {
                if self.stopped {
                    request.settle(Err(Error::Shutdown));
                } else {
                    self.queue.push_back(request);
                }
            }
            Command::Shutdown { mode, done } => {
                info!(?mode, queued = self.queue.len(), "request scheduler shutting down");
                self.shutdown_waiters.push(done);
                // Requests already in the channel still reach the queue
                self.commands.close();
                if mode == ShutdownMode::Cancel {
                    self.stopped = true;
                    while let Ok(command) = self.commands.try_recv() {
                        self.handle(command);
                    }
                    self.closed = true;
                    for request in self.queue.drain(..) {
                        request.settle(Err(Error::Shutdown));
                    }
                }
            }
        }
    }

    fn publish_quota(&self) {
        self.quota_tx.send_replace(self.quota.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, TimeDelta, Utc};
    use reqwest::StatusCode;
    use reqwest::header::{HeaderMap, HeaderValue};
    use tokio::time::Instant;

    use super::*;
    use crate::transport::classify;

    /// Clock that follows Tokio's (pausable) time.
    #[derive(Debug)]
    struct TokioClock {
        origin: Instant,
        epoch: DateTime<Utc>,
    }

    impl TokioClock {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                epoch: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            }
        }

        fn after(&self, secs: i64) -> DateTime<Utc> {
            self.epoch + TimeDelta::seconds(secs)
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            self.epoch + TimeDelta::from_std(self.origin.elapsed()).unwrap()
        }
    }

    /// A scripted reply for the fake transport.
    struct Reply {
        status: u16,
        quota: Option<QuotaState>,
        retry_after: Option<&'static str>,
    }

    impl Reply {
        const fn ok() -> Self {
            Self {
                status: 200,
                quota: None,
                retry_after: None,
            }
        }

        const fn status(status: u16) -> Self {
            Self {
                status,
                quota: None,
                retry_after: None,
            }
        }

        fn with_quota(mut self, quota: QuotaState) -> Self {
            self.quota = Some(quota);
            self
        }

        const fn with_retry_after(mut self, secs: &'static str) -> Self {
            self.retry_after = Some(secs);
            self
        }
    }

    /// Records every send and answers from a script (200 when exhausted).
    #[derive(Clone, Default)]
    struct FakeTransport {
        calls: Arc<Mutex<Vec<(String, Duration)>>>,
        replies: Arc<Mutex<VecDeque<Reply>>>,
        started: Arc<Mutex<Option<Instant>>>,
    }

    impl FakeTransport {
        fn scripted(replies: Vec<Reply>) -> Self {
            let fake = Self::default();
            *fake.replies.lock().unwrap() = replies.into();
            *fake.started.lock().unwrap() = Some(Instant::now());
            fake
        }

        fn paths(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(p, _)| p.clone())
                .collect()
        }

        fn call_times(&self) -> Vec<Duration> {
            self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    impl Transport for FakeTransport {
        async fn send(
            &self,
            request: &RequestDescriptor,
            quota: &mut QuotaState,
            now: DateTime<Utc>,
        ) -> Dispatch {
            let started = (*self.started.lock().unwrap()).unwrap_or_else(Instant::now);
            self.calls
                .lock()
                .unwrap()
                .push((request.path().to_string(), started.elapsed()));

            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(Reply::ok);

            let mut headers = HeaderMap::new();
            if let Some(update) = reply.quota {
                headers.insert("x-ratelimit-remaining", HeaderValue::from(update.remaining));
                *quota = update;
            }
            if let Some(secs) = reply.retry_after {
                headers.insert("retry-after", HeaderValue::from_static(secs));
            }

            let response = ApiResponse::new(
                StatusCode::from_u16(reply.status).unwrap(),
                headers,
                br#"{"message":"scripted"}"#.to_vec(),
            );
            classify(response, quota, now)
        }
    }

    fn spawn(transport: FakeTransport, clock: Arc<TokioClock>) -> RequestScheduler {
        RequestScheduler::spawn(transport, clock, Duration::ZERO).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_in_enqueue_order() {
        let transport = FakeTransport::scripted(Vec::new());
        let scheduler = spawn(transport.clone(), Arc::new(TokioClock::new()));

        let handles: Vec<_> = (0..5)
            .map(|i| scheduler.enqueue(RequestDescriptor::get(format!("/r/{i}"))).unwrap())
            .collect();
        for handle in handles {
            handle.wait().await.unwrap();
        }

        assert_eq!(transport.paths(), vec!["/r/0", "/r/1", "/r/2", "/r/3", "/r/4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_request_retried_before_later_ones() {
        let clock = Arc::new(TokioClock::new());
        let exhausted = QuotaState::new(5000, 0, clock.after(10), "core");
        let transport = FakeTransport::scripted(vec![
            Reply::ok(),
            Reply::status(403).with_quota(exhausted),
        ]);
        let scheduler = spawn(transport.clone(), Arc::clone(&clock));

        let a = scheduler.enqueue(RequestDescriptor::get("/a")).unwrap();
        let b = scheduler.enqueue(RequestDescriptor::get("/b")).unwrap();
        let c = scheduler.enqueue(RequestDescriptor::get("/c")).unwrap();

        a.wait().await.unwrap();
        b.wait().await.unwrap();
        c.wait().await.unwrap();

        assert_eq!(transport.paths(), vec!["/a", "/b", "/b", "/c"]);
        let times = transport.call_times();
        assert!(times[1] < Duration::from_secs(10));
        assert!(times[2] >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_quota_defers_until_reset() {
        let clock = Arc::new(TokioClock::new());
        let initial = QuotaState::new(5000, 1, clock.after(5), "core");
        let transport = FakeTransport::scripted(vec![
            Reply::ok().with_quota(QuotaState::new(5000, 0, clock.after(5), "core")),
        ]);
        let scheduler = RequestScheduler::spawn_with_quota(
            transport.clone(),
            clock,
            Duration::ZERO,
            initial,
        )
        .unwrap();

        let started = Instant::now();
        let first = scheduler.enqueue(RequestDescriptor::get("/first")).unwrap();
        let second = scheduler.enqueue(RequestDescriptor::get("/second")).unwrap();
        first.wait().await.unwrap();
        second.wait().await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(transport.paths(), vec!["/first", "/second"]);
        let times = transport.call_times();
        assert!(times[0] < Duration::from_secs(1));
        assert!(times[1] >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_is_surfaced_without_delay() {
        let transport = FakeTransport::scripted(vec![Reply::status(401)]);
        let scheduler = spawn(transport.clone(), Arc::new(TokioClock::new()));

        let started = Instant::now();
        let denied = scheduler.enqueue(RequestDescriptor::get("/denied")).unwrap();
        let next = scheduler.enqueue(RequestDescriptor::get("/next")).unwrap();

        assert!(matches!(denied.wait().await, Err(Error::Unauthorized { .. })));
        next.wait().await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(transport.paths(), vec!["/denied", "/next"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_secondary_rate_limit_honours_retry_after() {
        let transport =
            FakeTransport::scripted(vec![Reply::status(429).with_retry_after("3")]);
        let scheduler = spawn(transport.clone(), Arc::new(TokioClock::new()));

        scheduler
            .submit(RequestDescriptor::get("/search"))
            .await
            .unwrap();

        let times = transport.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_request_is_not_dispatched() {
        let clock = Arc::new(TokioClock::new());
        let exhausted = QuotaState::new(5000, 0, clock.after(30), "core");
        let transport = FakeTransport::scripted(Vec::new());
        let scheduler = RequestScheduler::spawn_with_quota(
            transport.clone(),
            clock,
            Duration::ZERO,
            exhausted,
        )
        .unwrap();

        let kept = scheduler.enqueue(RequestDescriptor::get("/kept")).unwrap();
        let cancelled = scheduler.enqueue(RequestDescriptor::get("/cancelled")).unwrap();
        let dropped = scheduler.enqueue(RequestDescriptor::get("/dropped")).unwrap();
        let last = scheduler.enqueue(RequestDescriptor::get("/last")).unwrap();
        cancelled.cancel();
        drop(dropped);

        kept.wait().await.unwrap();
        assert!(matches!(cancelled.wait().await, Err(Error::Cancelled)));
        last.wait().await.unwrap();
        assert_eq!(transport.paths(), vec!["/kept", "/last"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_exhausted_settles_immediately() {
        let clock = Arc::new(TokioClock::new());
        let exhausted = QuotaState::new(5000, 0, clock.after(3600), "core");
        let transport = FakeTransport::scripted(Vec::new());
        let scheduler = RequestScheduler::spawn_with_quota(
            transport.clone(),
            clock,
            Duration::ZERO,
            exhausted,
        )
        .unwrap();

        let head = scheduler.enqueue(RequestDescriptor::get("/head")).unwrap();
        let behind = scheduler.enqueue(RequestDescriptor::get("/behind")).unwrap();
        let abandoned = scheduler.enqueue(RequestDescriptor::get("/abandoned")).unwrap();
        let tail = scheduler.enqueue(RequestDescriptor::get("/tail")).unwrap();

        // Let the worker start waiting for the reset
        tokio::task::yield_now().await;

        let started = Instant::now();
        behind.cancel();
        assert!(matches!(behind.wait().await, Err(Error::Cancelled)));
        assert_eq!(started.elapsed(), Duration::ZERO);

        drop(abandoned);
        tokio::task::yield_now().await;
        assert!(transport.paths().is_empty());

        head.wait().await.unwrap();
        tail.wait().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3600));
        assert_eq!(transport.paths(), vec!["/head", "/tail"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_retry_after_keeps_worker_alive() {
        let transport = FakeTransport::scripted(vec![
            Reply::status(429).with_retry_after("100000000000000"),
        ]);
        let scheduler = spawn(transport.clone(), Arc::new(TokioClock::new()));

        scheduler
            .submit(RequestDescriptor::get("/search"))
            .await
            .unwrap();

        let times = transport.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] >= Duration::from_secs(3600));
        assert!(times[1] < Duration::from_secs(3602));

        scheduler.submit(RequestDescriptor::get("/next")).await.unwrap();
        assert_eq!(transport.paths(), vec!["/search", "/search", "/next"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancel_settles_pending() {
        let clock = Arc::new(TokioClock::new());
        let exhausted = QuotaState::new(5000, 0, clock.after(60), "core");
        let transport = FakeTransport::scripted(Vec::new());
        let scheduler = RequestScheduler::spawn_with_quota(
            transport.clone(),
            clock,
            Duration::ZERO,
            exhausted,
        )
        .unwrap();

        let a = scheduler.enqueue(RequestDescriptor::get("/a")).unwrap();
        let b = scheduler.enqueue(RequestDescriptor::get("/b")).unwrap();
        scheduler.shutdown(ShutdownMode::Cancel).await;

        assert!(matches!(a.wait().await, Err(Error::Shutdown)));
        assert!(matches!(b.wait().await, Err(Error::Shutdown)));
        assert!(transport.paths().is_empty());
        assert!(matches!(
            scheduler.enqueue(RequestDescriptor::get("/late")),
            Err(Error::SchedulerClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drain_finishes_queue() {
        let transport = FakeTransport::scripted(Vec::new());
        let scheduler = spawn(transport.clone(), Arc::new(TokioClock::new()));

        let handles: Vec<_> = ["/a", "/b", "/c"]
            .into_iter()
            .map(|p| scheduler.enqueue(RequestDescriptor::get(p)).unwrap())
            .collect();
        scheduler.shutdown(ShutdownMode::Drain).await;

        for handle in handles {
            handle.wait().await.unwrap();
        }
        assert_eq!(transport.paths(), vec!["/a", "/b", "/c"]);
        assert!(scheduler.enqueue(RequestDescriptor::get("/late")).is_err());

        // A second shutdown is a no-op
        scheduler.shutdown(ShutdownMode::Drain).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_snapshot_is_published() {
        let clock = Arc::new(TokioClock::new());
        let update = QuotaState::new(5000, 4242, clock.after(3600), "core");
        let transport = FakeTransport::scripted(vec![Reply::ok().with_quota(update.clone())]);
        let scheduler = spawn(transport, clock);

        assert_eq!(scheduler.quota(), QuotaState::default());
        scheduler.submit(RequestDescriptor::get("/user")).await.unwrap();
        assert_eq!(scheduler.quota(), update);
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = RequestScheduler::spawn(
            FakeTransport::default(),
            Arc::new(TokioClock::new()),
            Duration::ZERO,
        );
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId(7).to_string(), "#7");
    }
}
