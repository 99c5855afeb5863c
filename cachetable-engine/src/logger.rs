//! Per-table logging sink.
//!
//! A table emits its `tracing` events into the [`Logger`] attached to it and
//! stays silent when none is attached, regardless of any global subscriber.

use std::fmt;

use tracing::subscriber::Subscriber;
use tracing::Dispatch;

/// A `tracing` dispatcher owned by one table.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Wraps a subscriber.
    pub fn new<S>(subscriber: S) -> Self
    where
        S: Subscriber + Send + Sync + 'static,
    {
        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Captures the dispatcher that is currently the default for this thread.
    pub fn current() -> Self {
        tracing::dispatcher::get_default(|dispatch| Self {
            dispatch: dispatch.clone(),
        })
    }

    /// Returns the wrapped dispatcher.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with this logger as the default dispatcher.
    pub(crate) fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl From<Dispatch> for Logger {
    fn from(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// In-memory writer shared between a test and its subscriber.
    #[derive(Clone, Default)]
    pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Builds a logger that records every event at trace level and above.
    pub(crate) fn capture() -> (Logger, Capture) {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        (Logger::new(subscriber), capture)
    }

    #[test]
    fn test_in_scope_routes_events() {
        let (logger, capture) = capture();
        logger.in_scope(|| tracing::info!(answer = 42, "inside"));
        tracing::info!("outside");

        let out = capture.contents();
        assert!(out.contains("inside"));
        assert!(out.contains("answer=42"));
        assert!(!out.contains("outside"));
    }

    #[test]
    fn test_in_scope_returns_value() {
        let (logger, _) = capture();
        assert_eq!(logger.in_scope(|| 7), 7);
    }

    #[test]
    fn test_from_dispatch() {
        let (logger, capture) = capture();
        let cloned = Logger::from(logger.dispatch().clone());
        cloned.in_scope(|| tracing::warn!("via clone"));
        assert!(capture.contents().contains("via clone"));
    }

    #[test]
    fn test_current_inside_scope() {
        let (logger, capture) = capture();
        let captured = logger.in_scope(Logger::current);
        captured.in_scope(|| tracing::debug!("captured default"));
        assert!(capture.contents().contains("captured default"));
    }
}
