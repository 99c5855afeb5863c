//! Single-slot expiration timer.
//!
//! The scheduler holds at most one pending deadline. Arming keeps whichever
//! deadline is earlier, cancelling clears it, and when it comes due the
//! worker thread clears the slot and runs the tick. The tick re-arms the
//! timer itself if more items are pending.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Work run when a deadline fires. Returning `false` stops the worker.
pub(crate) type Tick = Arc<dyn Fn() -> bool + Send + Sync>;

/// Furthest a deadline is placed when the requested delay overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

#[derive(Default)]
struct Timer {
    deadline: Option<Instant>,
    interval: Duration,
    shutdown: bool,
}

struct Shared {
    timer: Mutex<Timer>,
    wakeup: Condvar,
}

/// Deadline slot plus the lazily spawned thread that services it.
pub(crate) struct Scheduler {
    shared: Arc<Shared>,
    tick: Tick,
    thread_name: String,
    background: bool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates an idle scheduler. No thread exists until the first `arm`.
    pub(crate) fn new(thread_name: String, background: bool, tick: Tick) -> Self {
        Self {
            shared: Arc::new(Shared {
                timer: Mutex::new(Timer::default()),
                wakeup: Condvar::new(),
            }),
            tick,
            thread_name,
            background,
            worker: Mutex::new(None),
        }
    }

    /// Schedules the tick `after` from now unless an earlier deadline is armed.
    ///
    /// Fails only if the worker thread could not be spawned; the deadline is
    /// recorded either way. Delays too large for `Instant` are clamped to a
    /// far-future deadline.
    pub(crate) fn arm(&self, after: Duration) -> io::Result<()> {
        let now = Instant::now();
        let deadline = match now.checked_add(after).or_else(|| now.checked_add(FAR_FUTURE)) {
            Some(deadline) => deadline,
            None => return Ok(()),
        };
        {
            let mut timer = self.shared.timer.lock();
            if timer.shutdown {
                return Ok(());
            }
            match timer.deadline {
                Some(current) if current <= deadline => return Ok(()),
                _ => {
                    timer.deadline = Some(deadline);
                    timer.interval = after;
                }
            }
        }
        self.shared.wakeup.notify_all();

        if self.background {
            self.ensure_worker()?;
        }
        Ok(())
    }

    /// Drops the pending deadline, if any.
    pub(crate) fn cancel(&self) {
        let mut timer = self.shared.timer.lock();
        timer.deadline = None;
        timer.interval = Duration::ZERO;
        drop(timer);
        self.shared.wakeup.notify_all();
    }

    /// Time until the pending deadline, or `None` when nothing is armed.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.shared
            .timer
            .lock()
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Interval the pending deadline was armed with (zero when idle).
    pub(crate) fn interval(&self) -> Duration {
        self.shared.timer.lock().interval
    }

    /// Stops the worker and refuses further arming.
    ///
    /// Joins the worker unless called from the worker itself.
    pub(crate) fn shutdown(&self) {
        {
            let mut timer = self.shared.timer.lock();
            timer.shutdown = true;
            timer.deadline = None;
            timer.interval = Duration::ZERO;
        }
        self.shared.wakeup.notify_all();

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                // A panicked tick already surfaced on the worker thread.
                let _ = handle.join();
            }
        }
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shared.timer.lock().shutdown
    }

    fn ensure_worker(&self) -> io::Result<()> {
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.as_ref() {
            if !handle.is_finished() {
                return Ok(());
            }
        }

        let shared = Arc::clone(&self.shared);
        let tick = Arc::clone(&self.tick);
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || run(&shared, &tick))?;
        *worker = Some(handle);
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: &Shared, tick: &Tick) {
    let mut timer = shared.timer.lock();
    loop {
        if timer.shutdown {
            return;
        }
        match timer.deadline {
            None => shared.wakeup.wait(&mut timer),
            Some(deadline) if Instant::now() < deadline => {
                shared.wakeup.wait_until(&mut timer, deadline);
            }
            Some(_) => {
                timer.deadline = None;
                timer.interval = Duration::ZERO;
                let keep_running = MutexGuard::unlocked(&mut timer, || tick());
                if !keep_running {
                    return;
                }
            }
        }
    }
}
