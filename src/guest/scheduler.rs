//! # Guest-mode scheduler: a cooperative executor that only runs when the host lets it.
//!
//! The scheduler owns no thread. Every unit of work happens inside a *tick*, and ticks
//! are requested through the reentry hook supplied at [`start_guest_run`], so they run
//! on whatever thread dispatches the host's posted events.
//!
//! ## Architecture
//! ```text
//! waker.wake() / spawn() ──► ready queue ──► request_tick ──► reentry(cb)
//!                                                                 │
//!            host thread ◄── posted WakeRequest ◄─────────────────┘
//!                 │
//!                 ▼
//!             run_tick()
//!               ├─► fire expired timers
//!               ├─► poll the ready batch once
//!               └─► decide
//!                     ├─ main finished  ─► close, then done(outcome)
//!                     ├─ ready work     ─► request another tick
//!                     ├─ timers pending ─► arm TimerThread (or tick now)
//!                     └─ nothing        ─► idle until a waker fires
//! ```
//!
//! ## Rules
//! - At most one tick is outstanding at any time (`tick_posted`).
//! - The first tick is requested through the hook, never run synchronously.
//! - A task woken while it is being polled runs again in the *next* tick.
//! - When the main task finishes, the remaining tasks are dropped at their suspension
//!   point before `done` is called.
//! - The timer thread only posts ticks; it never polls futures.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::mem;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::task::{ArcWake, waker};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tokio::sync::oneshot;

use super::clock::{Clock, SystemClock};
use crate::error::BridgeError;
use crate::outcome::Outcome;
use crate::reentry::Callback;

type BoxTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Hook asking the host to run a callback on its thread soon.
pub type Reentry = Arc<dyn Fn(Callback) + Send + Sync + 'static>;

thread_local! {
    static CURRENT: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Parameters of a guest run.
pub struct GuestRunConfig<T> {
    /// Thread-safe, non-blocking "run this on the host thread" hook.
    pub reentry: Reentry,
    /// Called once, on the host thread, with the main task's outcome.
    pub done: Box<dyn FnOnce(Outcome<T>) + Send + 'static>,
    /// Time source; [`SystemClock`] when `None`.
    pub clock: Option<Arc<dyn Clock>>,
}

impl<T> GuestRunConfig<T> {
    /// Creates a config with the system clock.
    pub fn new<R, D>(reentry: R, done: D) -> Self
    where
        R: Fn(Callback) + Send + Sync + 'static,
        D: FnOnce(Outcome<T>) + Send + 'static,
    {
        Self {
            reentry: Arc::new(reentry),
            done: Box::new(done),
            clock: None,
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

/// Starts `main` as the top-level task of a new guest run.
///
/// Returns immediately; the first tick is requested through `config.reentry`.
pub fn start_guest_run<F, T>(main: F, config: GuestRunConfig<T>) -> Handle
where
    F: Future<Output = Result<T, BridgeError>> + Send + 'static,
    T: Send + 'static,
{
    let GuestRunConfig {
        reentry,
        done,
        clock,
    } = config;

    let clock = clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
    clock.start_clock();

    let handle = Handle {
        shared: Arc::new(Shared {
            reentry,
            clock,
            state: Mutex::new(State::default()),
            timer: TimerThread::default(),
        }),
    };

    let finisher = handle.clone();
    handle.insert(Box::pin(async move {
        let outcome = Outcome::capture(main).await;
        finisher.finish(Box::new(move || done(outcome)));
    }));

    tracing::debug!("guest run started");
    handle
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TaskId(u64);

struct TaskSlot {
    /// `None` while the task is checked out for polling.
    future: Option<BoxTask>,
    waker: Waker,
}

#[derive(Default)]
struct State {
    tasks: HashMap<TaskId, TaskSlot>,
    ready: VecDeque<TaskId>,
    queued: HashSet<TaskId>,
    timers: BTreeMap<(Duration, u64), Waker>,
    next_task: u64,
    next_timer: u64,
    tick_posted: bool,
    finished: Option<Callback>,
    closed: bool,
}

struct Shared {
    reentry: Reentry,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
    timer: TimerThread,
}

enum NextStep {
    Finish(Callback),
    Tick,
    Arm(Duration),
    Idle,
}

impl Shared {
    fn post_tick(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        (self.reentry)(Box::new(move || shared.run_tick()));
    }

    fn request_tick(self: &Arc<Self>) {
        let post = {
            let mut state = self.state.lock();
            !state.closed && !mem::replace(&mut state.tick_posted, true)
        };
        if post {
            self.post_tick();
        }
    }

    fn schedule(self: &Arc<Self>, id: TaskId) {
        let post = {
            let mut state = self.state.lock();
            if state.closed || !state.tasks.contains_key(&id) || !state.queued.insert(id) {
                return;
            }
            state.ready.push_back(id);
            !mem::replace(&mut state.tick_posted, true)
        };
        if post {
            self.post_tick();
        }
    }

    fn run_tick(self: &Arc<Self>) {
        let guard = enter(Handle {
            shared: Arc::clone(self),
        });

        let now = self.clock.current_time();
        let expired = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            let later = state.timers.split_off(&(now, u64::MAX));
            mem::replace(&mut state.timers, later)
        };
        for (_, waker) in expired {
            waker.wake();
        }

        let batch: Vec<TaskId> = {
            let mut state = self.state.lock();
            state.queued.clear();
            state.ready.drain(..).collect()
        };

        for id in batch {
            let (mut future, waker) = {
                let mut state = self.state.lock();
                if state.finished.is_some() {
                    break;
                }
                let Some(slot) = state.tasks.get_mut(&id) else {
                    continue;
                };
                let Some(future) = slot.future.take() else {
                    continue;
                };
                (future, slot.waker.clone())
            };

            let mut cx = Context::from_waker(&waker);
            let ready = future.as_mut().poll(&mut cx).is_ready();

            let mut state = self.state.lock();
            if ready {
                state.tasks.remove(&id);
            } else if let Some(slot) = state.tasks.get_mut(&id) {
                slot.future = Some(future);
                continue;
            }
            // completed futures are dropped with the lock released
            drop(state);
        }

        let next = {
            let mut state = self.state.lock();
            if let Some(finish) = state.finished.take() {
                NextStep::Finish(finish)
            } else if !state.ready.is_empty() {
                NextStep::Tick
            } else {
                state.tick_posted = false;
                match state.timers.keys().next() {
                    Some(&(deadline, _)) => NextStep::Arm(deadline),
                    None => NextStep::Idle,
                }
            }
        };

        match next {
            NextStep::Finish(finish) => {
                self.close();
                drop(guard);
                tracing::debug!("guest run finished");
                finish();
            }
            NextStep::Tick => self.post_tick(),
            NextStep::Arm(deadline) => self.arm(deadline),
            NextStep::Idle => {}
        }
    }

    fn arm(self: &Arc<Self>, deadline: Duration) {
        let sleep = self.clock.deadline_to_sleep_time(deadline);
        if sleep.is_zero() {
            self.request_tick();
            return;
        }
        // None: the clock never reaches the deadline by itself.
        let at = Instant::now().checked_add(sleep);
        if let Err(err) = self.timer.arm(Arc::downgrade(self), at) {
            tracing::error!(error = %err, "failed to spawn guest timer thread; polling instead");
            self.request_tick();
        }
    }

    /// Drops every remaining task and timer and stops the timer thread.
    fn close(&self) {
        let (tasks, timers, finished) = {
            let mut state = self.state.lock();
            state.closed = true;
            state.ready.clear();
            state.queued.clear();
            (
                mem::take(&mut state.tasks),
                mem::take(&mut state.timers),
                state.finished.take(),
            )
        };
        self.timer.shutdown();
        drop(timers);
        drop(tasks);
        drop(finished);
    }
}

struct TaskWaker {
    id: TaskId,
    shared: Arc<Shared>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.shared.schedule(arc_self.id);
    }
}

/// Restores the previous current handle on drop.
struct EnterGuard {
    previous: Option<Handle>,
}

fn enter(handle: Handle) -> EnterGuard {
    let previous = CURRENT.with(|current| current.borrow_mut().replace(handle));
    EnterGuard { previous }
}

impl Drop for EnterGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// Reference to a running guest scheduler.
#[derive(Clone)]
pub struct Handle {
    shared: Arc<Shared>,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Handle")
            .field("tasks", &state.tasks.len())
            .field("timers", &state.timers.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl Handle {
    /// Returns the handle of the guest run currently ticking on this thread.
    ///
    /// # Panics
    /// Panics when called outside of a guest task.
    pub fn current() -> Handle {
        match Self::try_current() {
            Some(handle) => handle,
            None => panic!("must be called from within a guest task"),
        }
    }

    /// Like [`Handle::current`], but returns `None` outside of a guest task.
    pub fn try_current() -> Option<Handle> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Current guest time.
    pub fn now(&self) -> Duration {
        self.shared.clock.current_time()
    }

    /// The run's time source.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.shared.clock
    }

    /// Whether the run has finished and dropped its tasks.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Spawns `fut` as a new task of this run.
    ///
    /// The task is detached if the returned handle is dropped. Spawning on a closed run
    /// drops the future; its handle resolves to [`JoinError::Cancelled`].
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.insert(Box::pin(async move {
            let result = AssertUnwindSafe(fut).catch_unwind().await;
            let _ = tx.send(result);
        }));
        JoinHandle { rx }
    }

    /// Stops the run without reporting an outcome.
    ///
    /// Used when the host exits before the main task finished.
    pub(crate) fn shutdown(&self) {
        self.shared.close();
    }

    fn insert(&self, task: BoxTask) {
        let post = {
            let mut state = self.shared.state.lock();
            if state.closed {
                drop(state);
                drop(task);
                return;
            }
            let id = TaskId(state.next_task);
            state.next_task += 1;

            let waker = waker(Arc::new(TaskWaker {
                id,
                shared: Arc::clone(&self.shared),
            }));
            state.tasks.insert(
                id,
                TaskSlot {
                    future: Some(task),
                    waker,
                },
            );
            state.queued.insert(id);
            state.ready.push_back(id);
            !mem::replace(&mut state.tick_posted, true)
        };
        if post {
            self.shared.post_tick();
        }
    }

    fn finish(&self, callback: Callback) {
        self.shared.state.lock().finished = Some(callback);
    }

    /// Registers `waker` to fire at `deadline`; returns the timer key.
    pub(crate) fn register_timer(
        &self,
        deadline: Duration,
        key: Option<u64>,
        waker: &Waker,
    ) -> u64 {
        let mut state = self.shared.state.lock();
        let key = key.unwrap_or_else(|| {
            state.next_timer += 1;
            state.next_timer
        });
        if !state.closed {
            state.timers.insert((deadline, key), waker.clone());
        }
        key
    }

    pub(crate) fn cancel_timer(&self, deadline: Duration, key: u64) {
        let removed = self.shared.state.lock().timers.remove(&(deadline, key));
        drop(removed);
    }
}

/// Spawns `fut` on the current guest run.
///
/// # Panics
/// Panics when called outside of a guest task.
pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    Handle::current().spawn(fut)
}

/// Why a spawned task produced no value.
#[derive(Error, Debug)]
pub enum JoinError {
    /// The task was dropped before finishing (its run ended first).
    #[error("task was cancelled")]
    Cancelled,
    /// The task panicked.
    #[error("task panicked")]
    Panic(Box<dyn std::any::Any + Send + 'static>),
}

impl JoinError {
    /// Whether the task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JoinError::Cancelled)
    }

    /// Returns the panic payload.
    ///
    /// # Panics
    /// Panics if the task was cancelled instead.
    pub fn into_panic(self) -> Box<dyn std::any::Any + Send + 'static> {
        match self {
            JoinError::Panic(payload) => payload,
            JoinError::Cancelled => panic!("task was cancelled, not panicked"),
        }
    }
}

/// Awaitable result of a spawned task.
#[must_use = "dropping a JoinHandle detaches the task"]
pub struct JoinHandle<T> {
    rx: oneshot::Receiver<thread::Result<T>>,
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle").finish_non_exhaustive()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(JoinError::Panic(payload)),
            Err(_) => Err(JoinError::Cancelled),
        })
    }
}

/// Yields once, letting every other ready task run first.
pub async fn yield_now() {
    struct YieldNow {
        yielded: bool,
    }

    impl Future for YieldNow {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.yielded {
                return Poll::Ready(());
            }
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    YieldNow { yielded: false }.await
}

#[derive(Default)]
struct TimerState {
    /// `Some(None)`: armed without a real-time deadline.
    deadline: Option<Option<Instant>>,
    spawned: bool,
    shutdown: bool,
}

#[derive(Default)]
struct TimerInner {
    state: Mutex<TimerState>,
    cond: Condvar,
}

/// Lazily spawned thread that posts a tick when the earliest deadline is reached.
#[derive(Default)]
struct TimerThread {
    inner: Arc<TimerInner>,
}

impl TimerThread {
    fn arm(&self, shared: Weak<Shared>, at: Option<Instant>) -> std::io::Result<()> {
        let mut state = self.inner.state.lock();
        if state.shutdown {
            return Ok(());
        }
        state.deadline = Some(at);
        if !state.spawned {
            let inner = Arc::clone(&self.inner);
            thread::Builder::new()
                .name("loopbridge-timer".into())
                .spawn(move || timer_loop(inner, shared))?;
            state.spawned = true;
        }
        self.inner.cond.notify_one();
        Ok(())
    }

    fn shutdown(&self) {
        self.inner.state.lock().shutdown = true;
        self.inner.cond.notify_one();
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn timer_loop(inner: Arc<TimerInner>, shared: Weak<Shared>) {
    let mut state = inner.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        match state.deadline {
            None | Some(None) => inner.cond.wait(&mut state),
            Some(Some(at)) => {
                if Instant::now() < at {
                    inner.cond.wait_until(&mut state, at);
                    continue;
                }
                state.deadline = None;
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                // The upgraded handle may be the last one; it must drop while unlocked.
                parking_lot::MutexGuard::unlocked(&mut state, move || shared.request_tick());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::clock::MockClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Minimal host: a queue of callbacks drained on the test thread.
    #[derive(Clone)]
    struct Pump {
        tx: mpsc::Sender<Callback>,
        posted: Arc<AtomicUsize>,
    }

    fn pump() -> (Pump, mpsc::Receiver<Callback>) {
        let (tx, rx) = mpsc::channel();
        (
            Pump {
                tx,
                posted: Arc::new(AtomicUsize::new(0)),
            },
            rx,
        )
    }

    fn config<T: Send + 'static>(
        pump: &Pump,
        out: Arc<Mutex<Option<Outcome<T>>>>,
    ) -> GuestRunConfig<T> {
        let p = pump.clone();
        GuestRunConfig::new(
            move |cb| {
                p.posted.fetch_add(1, Ordering::SeqCst);
                let _ = p.tx.send(cb);
            },
            move |outcome| *out.lock() = Some(outcome),
        )
    }

    fn drain<T>(rx: &mpsc::Receiver<Callback>, out: &Mutex<Option<Outcome<T>>>) -> Outcome<T> {
        loop {
            if let Some(outcome) = out.lock().take() {
                return outcome;
            }
            let cb = rx
                .recv_timeout(Duration::from_secs(5))
                .expect("guest run stalled");
            cb();
        }
    }

    #[test]
    fn test_first_tick_is_not_synchronous() {
        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);

        start_guest_run(
            async move {
                r.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            },
            config(&pump, Arc::clone(&out)),
        );
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(pump.posted.load(Ordering::SeqCst), 1);

        assert_eq!(drain(&rx, &out).unwrap().ok(), Some(7));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_spawn_and_join() {
        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));

        start_guest_run(
            async {
                let a = spawn(async { 1 });
                let b = spawn(async {
                    yield_now().await;
                    2
                });
                let (a, b) = (a.await, b.await);
                Ok(a.map_err(BridgeError::failed)? + b.map_err(BridgeError::failed)?)
            },
            config(&pump, Arc::clone(&out)),
        );
        assert_eq!(drain(&rx, &out).unwrap().ok(), Some(3));
    }

    #[test]
    fn test_spawned_panic_is_reported_to_joiner() {
        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));

        start_guest_run(
            async {
                let err = spawn(async { panic!("child") })
                    .await
                    .expect_err("child panicked");
                Ok(!err.is_cancelled())
            },
            config(&pump, Arc::clone(&out)),
        );
        assert_eq!(drain(&rx, &out).unwrap().ok(), Some(true));
    }

    #[test]
    fn test_main_panic_is_captured() {
        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));

        start_guest_run(
            async {
                assert_eq!(1, 2, "boom");
                Ok(())
            },
            config(&pump, Arc::clone(&out)),
        );
        let outcome = drain(&rx, &out);
        assert!(outcome.panic_message().is_some_and(|m| m.contains("boom")));
    }

    #[test]
    fn test_leftover_tasks_are_dropped_on_finish() {
        struct DropFlag(Arc<AtomicUsize>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));
        let dropped = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&dropped);

        let handle = start_guest_run(
            async move {
                let flag = DropFlag(d);
                let _detached = spawn(async move {
                    let _flag = flag;
                    futures::future::pending::<()>().await;
                });
                yield_now().await;
                Ok(())
            },
            config(&pump, Arc::clone(&out)),
        );
        assert!(drain(&rx, &out).is_value());
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
        assert!(handle.is_closed());
    }

    #[test]
    fn test_one_tick_outstanding() {
        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));

        start_guest_run(
            async {
                for _ in 0..10 {
                    let _ = spawn(yield_now());
                }
                yield_now().await;
                Ok(())
            },
            config(&pump, Arc::clone(&out)),
        );
        let mut executed = 0;
        while out.lock().is_none() {
            let cb = rx.recv_timeout(Duration::from_secs(5)).expect("stalled");
            cb();
            executed += 1;
            assert!(pump.posted.load(Ordering::SeqCst) - executed <= 1);
        }
    }

    #[test]
    fn test_timer_thread_fires_with_system_clock() {
        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));

        start_guest_run(
            async {
                crate::guest::sleep(Duration::from_millis(20)).await;
                Ok(Handle::current().now())
            },
            config(&pump, Arc::clone(&out)),
        );
        let elapsed = drain(&rx, &out).unwrap().expect("value");
        assert!(elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn test_mock_clock_autojumps() {
        let (pump, rx) = pump();
        let out = Arc::new(Mutex::new(None));
        let clock = Arc::new(MockClock::autojump());

        start_guest_run(
            async {
                crate::guest::sleep(Duration::from_secs(3600)).await;
                Ok(Handle::current().now())
            },
            config(&pump, Arc::clone(&out)).with_clock(clock),
        );
        assert_eq!(
            drain(&rx, &out).unwrap().ok(),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_current_outside_guest() {
        assert!(Handle::try_current().is_none());
        let err = std::panic::catch_unwind(Handle::current).expect_err("no guest");
        assert!(crate::outcome::payload_message(err.as_ref()).is_some());
    }

    #[test]
    fn test_timer_thread_survives_dropping_the_last_handle() {
        let (called_tx, called_rx) = mpsc::channel::<()>();
        let (released_tx, released_rx) = mpsc::channel::<()>();
        let released_rx = Mutex::new(released_rx);
        let reentry: Reentry = Arc::new(move |_cb: Callback| {
            let _ = called_tx.send(());
            let _ = released_rx.lock().recv_timeout(Duration::from_secs(5));
        });

        let shared = Arc::new(Shared {
            reentry,
            clock: Arc::new(SystemClock::new()),
            state: Mutex::new(State::default()),
            timer: TimerThread::default(),
        });
        let timer = Arc::clone(&shared.timer.inner);
        shared
            .timer
            .arm(Arc::downgrade(&shared), Some(Instant::now()))
            .expect("timer thread");

        called_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("tick requested");
        drop(shared);
        released_tx.send(()).expect("release");

        let give_up = Instant::now() + Duration::from_secs(5);
        while Arc::strong_count(&timer) > 1 {
            assert!(Instant::now() < give_up, "timer thread stuck");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(timer.state.lock().shutdown);
    }
}
