//! Background polling for the customer chat widget and the support desk.
//!
//! Each poller runs its loops on tokio intervals. A tick is skipped while
//! the view is hidden or the previous request of the same loop is still in
//! flight. A 401 from any endpoint stops every loop of the poller; other
//! failures are logged and the next tick tries again.

mod desk;
mod poller;

pub use desk::{DeskEvent, SupportDesk};
pub use poller::{ChatEvent, ChatPoller};

use crate::error::ClientError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Capacity of the event channels; slow subscribers miss old events.
const EVENT_CAPACITY: usize = 64;

/// Shortest accepted polling period.
const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Visibility and shutdown state shared by a poller's loops.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    visible: AtomicBool,
    stopped: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            visible: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Whether a tick should do any work.
    pub(crate) fn is_active(&self) -> bool {
        self.visible.load(Ordering::SeqCst) && !self.is_stopped()
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    /// Signal every loop to exit. Requests already sent run to completion;
    /// their results are dropped.
    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.shutdown.send_replace(true);
    }

    fn restart(&self) -> watch::Receiver<bool> {
        self.stopped.store(false, Ordering::SeqCst);
        self.shutdown.send_replace(false);
        self.shutdown.subscribe()
    }
}

/// Running loops of a poller. Dropping the handle stops them.
#[derive(Debug)]
pub struct PollerHandle {
    lifecycle: Arc<Lifecycle>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        !self.lifecycle.is_stopped() && self.tasks.iter().any(|t| !t.is_finished())
    }

    /// Stop the loops and wait for them to exit.
    pub async fn stop(mut self) {
        self.lifecycle.stop();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "chat polling task failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.lifecycle.stop();
    }
}

/// Start one loop per `(name, period, tick)` entry.
pub(crate) fn spawn_loops(
    lifecycle: &Arc<Lifecycle>,
    loops: Vec<(&'static str, Duration, Tick)>,
) -> PollerHandle {
    let shutdown = lifecycle.restart();
    let tasks = loops
        .into_iter()
        .map(|(name, period, tick)| {
            tokio::spawn(run_loop(
                name,
                period,
                Arc::clone(lifecycle),
                shutdown.clone(),
                tick,
            ))
        })
        .collect();
    PollerHandle {
        lifecycle: Arc::clone(lifecycle),
        tasks,
    }
}

pub(crate) type TickFuture =
    std::pin::Pin<Box<dyn Future<Output = Result<(), ClientError>> + Send>>;

pub(crate) type Tick = Box<dyn FnMut() -> TickFuture + Send>;

/// Box a tick function for [`spawn_loops`].
pub(crate) fn ticker<F, Fut>(f: F) -> Tick
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ClientError>> + Send + 'static,
{
    Box::new(move || -> TickFuture { Box::pin(f()) })
}

async fn run_loop(
    name: &'static str,
    period: Duration,
    lifecycle: Arc<Lifecycle>,
    mut shutdown: watch::Receiver<bool>,
    mut tick: Tick,
) {
    let period = period.max(MIN_PERIOD);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(task = name, period_ms = period.as_millis() as u64, "polling started");

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }
        if lifecycle.is_stopped() {
            break;
        }
        match tick().await {
            Ok(()) => {}
            Err(e) if e.is_unauthorized() => break,
            Err(e) => warn!(task = name, error = %e, "poll failed"),
        }
    }
    debug!(task = name, "polling stopped");
}

/// Lock a state mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
