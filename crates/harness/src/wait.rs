//! Bounded polling
//!
//! [`Waiter`] calls a producer repeatedly until it yields a result or a
//! deadline passes. Between attempts it prints a progress dot (or a debug
//! log line in debug mode), invokes an optional reporter and sleeps for the
//! poll interval. Everything blocks the calling thread; there is no
//! cancellation.
//!
//! Running out of time is quiet (`Ok(None)`) for explicitly chosen timeouts.
//! When the wait used the default timeout it is reported as
//! [`Error::DefaultTimeoutElapsed`].

use parking_lot::Mutex;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use sysio_harness_common::{Error, Result};

/// Timeout used when none is given
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause between attempts when none is given
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timing parameters of a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// `None` selects [`DEFAULT_WAIT_TIMEOUT`]
    pub timeout: Option<Duration>,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    /// Options with an explicit timeout and the default interval
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT)
    }
}

/// Decides whether a producer's return value is a result yet.
///
/// `None`, `false`, JSON `null` and JSON `false` mean "keep waiting".
/// Anything else, including `0`, empty strings and empty collections, is a
/// result.
pub trait Readiness {
    type Output;

    fn into_ready(self) -> Option<Self::Output>;
}

impl<T> Readiness for Option<T> {
    type Output = T;

    fn into_ready(self) -> Option<T> {
        self
    }
}

impl Readiness for bool {
    type Output = bool;

    fn into_ready(self) -> Option<bool> {
        self.then_some(true)
    }
}

impl Readiness for Value {
    type Output = Value;

    fn into_ready(self) -> Option<Value> {
        match self {
            Value::Null | Value::Bool(false) => None,
            other => Some(other),
        }
    }
}

/// Truthiness of a predicate result for the boolean waits.
///
/// Unlike [`Readiness`], `Some(false)` does not hold.
pub trait Condition {
    fn holds(self) -> bool;
}

impl Condition for bool {
    fn holds(self) -> bool {
        self
    }
}

impl Condition for Option<bool> {
    fn holds(self) -> bool {
        self == Some(true)
    }
}

impl Condition for Value {
    fn holds(self) -> bool {
        Readiness::into_ready(self).is_some()
    }
}

/// Blocking poll loop with progress reporting
pub struct Waiter {
    clock: Arc<dyn Clock>,
    debug: bool,
    progress: Mutex<Box<dyn Write + Send>>,
}

impl Waiter {
    /// Waiter on real time that prints progress dots to stdout
    pub fn new(debug: bool) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            debug,
            progress: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Send progress dots somewhere other than stdout
    pub fn with_progress_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.progress = Mutex::new(Box::new(writer));
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Poll `producer` until it yields a result or the timeout elapses
    pub fn wait_for_value<P, F>(&self, producer: F, options: WaitOptions) -> Result<Option<P::Output>>
    where
        F: FnMut() -> P,
        P: Readiness,
    {
        self.poll(producer, options, None)
    }

    /// Like [`Waiter::wait_for_value`], calling `reporter` after every
    /// attempt that produced no result
    pub fn wait_for_value_with_reporter<P, F, R>(
        &self,
        producer: F,
        options: WaitOptions,
        mut reporter: R,
    ) -> Result<Option<P::Output>>
    where
        F: FnMut() -> P,
        P: Readiness,
        R: FnMut(),
    {
        self.poll(producer, options, Some(&mut reporter))
    }

    /// Poll until `predicate` holds; `Ok(false)` when an explicit timeout
    /// elapses first
    pub fn wait_for_bool<P, F>(&self, mut predicate: F, options: WaitOptions) -> Result<bool>
    where
        F: FnMut() -> P,
        P: Condition,
    {
        Ok(self.poll(|| predicate().holds(), options, None)?.is_some())
    }

    pub fn wait_for_bool_with_reporter<P, F, R>(
        &self,
        mut predicate: F,
        options: WaitOptions,
        mut reporter: R,
    ) -> Result<bool>
    where
        F: FnMut() -> P,
        P: Condition,
        R: FnMut(),
    {
        Ok(self
            .poll(|| predicate().holds(), options, Some(&mut reporter))?
            .is_some())
    }

    /// Poll `predicate(arg, timeout)`, handing the predicate the same timeout
    /// the wait runs under so it can bound its own inner waits
    pub fn wait_for_bool_with_arg<A, P, F>(
        &self,
        mut predicate: F,
        arg: &A,
        options: WaitOptions,
    ) -> Result<bool>
    where
        A: ?Sized,
        F: FnMut(&A, Option<Duration>) -> P,
        P: Condition,
    {
        let timeout = options.timeout;
        self.wait_for_bool(|| predicate(arg, timeout), options)
    }

    fn poll<P, F>(
        &self,
        mut producer: F,
        options: WaitOptions,
        mut reporter: Option<&mut dyn FnMut()>,
    ) -> Result<Option<P::Output>>
    where
        F: FnMut() -> P,
        P: Readiness,
    {
        let timeout = options.effective_timeout();
        // No deadline when the timeout is beyond what an Instant can represent
        let deadline = self.clock.now().checked_add(timeout);
        let mut needs_newline = false;

        let outcome = loop {
            let now = self.clock.now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                break None;
            }
            if let Some(value) = producer().into_ready() {
                break Some(value);
            }

            if self.debug {
                match deadline {
                    Some(deadline) => debug!(
                        "cmd: sleep {:.3} seconds, remaining time: {} seconds",
                        options.interval.as_secs_f64(),
                        (deadline - now).as_secs()
                    ),
                    None => debug!("cmd: sleep {:.3} seconds", options.interval.as_secs_f64()),
                }
            } else {
                self.write_progress(".");
                needs_newline = true;
            }
            if let Some(reporter) = reporter.as_deref_mut() {
                reporter();
            }
            self.clock.sleep(options.interval);
        };

        if needs_newline {
            self.write_progress("\n");
        }

        match outcome {
            Some(value) => Ok(Some(value)),
            None if timeout == DEFAULT_WAIT_TIMEOUT => Err(Error::DefaultTimeoutElapsed {
                seconds: timeout.as_secs(),
            }),
            None => Ok(None),
        }
    }

    // Progress output is best effort
    fn write_progress(&self, text: &str) {
        let mut out = self.progress.lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    fn manual_waiter(debug: bool) -> (Waiter, Arc<ManualClock>, Captured) {
        let clock = Arc::new(ManualClock::new());
        let out = Captured::default();
        let waiter = Waiter::new(debug)
            .with_clock(clock.clone())
            .with_progress_writer(out.clone());
        (waiter, clock, out)
    }

    #[test]
    fn test_immediate_value_does_not_sleep() {
        let (waiter, clock, out) = manual_waiter(false);
        let value = waiter
            .wait_for_value(|| Some(42), WaitOptions::timeout(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(value, Some(42));
        assert_eq!(clock.sleep_count(), 0);
        assert_eq!(out.text(), "");
    }

    #[test]
    fn test_explicit_timeout_returns_none_quietly() {
        let (waiter, clock, out) = manual_waiter(false);
        let options = WaitOptions::timeout(Duration::from_secs(2)).with_interval(Duration::from_secs(1));
        let value = waiter.wait_for_value(|| None::<u32>, options).unwrap();
        assert_eq!(value, None);
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(out.text(), "..\n");
    }

    #[test]
    fn test_default_timeout_is_a_hard_failure() {
        let (waiter, clock, _out) = manual_waiter(false);
        let result = waiter.wait_for_value(|| None::<u32>, WaitOptions::default());
        assert!(matches!(result, Err(Error::DefaultTimeoutElapsed { seconds: 60 })));
        assert_eq!(clock.elapsed(), DEFAULT_WAIT_TIMEOUT);
    }

    #[test]
    fn test_explicit_sixty_seconds_counts_as_default() {
        let (waiter, _clock, _out) = manual_waiter(false);
        let result = waiter.wait_for_bool(|| false, WaitOptions::timeout(Duration::from_secs(60)));
        assert!(matches!(result, Err(Error::DefaultTimeoutElapsed { .. })));
    }

    #[test]
    fn test_value_after_some_attempts() {
        let (waiter, clock, out) = manual_waiter(false);
        let mut attempts = 0;
        let value = waiter
            .wait_for_value(
                || {
                    attempts += 1;
                    (attempts == 4).then_some("ready")
                },
                WaitOptions::timeout(Duration::from_secs(10)),
            )
            .unwrap();
        assert_eq!(value, Some("ready"));
        assert_eq!(clock.sleep_count(), 3);
        assert_eq!(out.text(), "...\n");
    }

    #[test]
    fn test_debug_mode_prints_no_dots() {
        let (waiter, _clock, out) = manual_waiter(true);
        let value = waiter
            .wait_for_value(|| None::<()>, WaitOptions::timeout(Duration::from_secs(3)))
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(out.text(), "");
    }

    #[test]
    fn test_reporter_runs_after_each_empty_attempt() {
        let (waiter, _clock, _out) = manual_waiter(false);
        let mut calls = 0;
        let mut reports = 0;
        let value = waiter
            .wait_for_value_with_reporter(
                || {
                    calls += 1;
                    (calls > 2).then_some(calls)
                },
                WaitOptions::timeout(Duration::from_secs(10)),
                || reports += 1,
            )
            .unwrap();
        assert_eq!(value, Some(3));
        assert_eq!(reports, 2);
    }

    #[test]
    fn test_json_readiness() {
        let (waiter, clock, _out) = manual_waiter(false);
        let options = WaitOptions::timeout(Duration::from_secs(5));

        assert_eq!(waiter.wait_for_value(|| json!(0), options).unwrap(), Some(json!(0)));
        assert_eq!(waiter.wait_for_value(|| json!([]), options).unwrap(), Some(json!([])));
        assert_eq!(waiter.wait_for_value(|| json!(""), options).unwrap(), Some(json!("")));
        assert_eq!(clock.sleep_count(), 0);

        assert_eq!(waiter.wait_for_value(|| json!(false), options).unwrap(), None);
        assert_eq!(waiter.wait_for_value(|| Value::Null, options).unwrap(), None);
    }

    #[test]
    fn test_wait_for_bool() {
        let (waiter, _clock, _out) = manual_waiter(false);
        let options = WaitOptions::timeout(Duration::from_secs(3));
        assert!(!waiter.wait_for_bool(|| false, options).unwrap());

        let mut height = 0u32;
        let reached = waiter
            .wait_for_bool(
                || {
                    height += 1;
                    height >= 2
                },
                options,
            )
            .unwrap();
        assert!(reached);
    }

    #[test]
    fn test_wait_for_bool_false_option_keeps_waiting() {
        let (waiter, clock, out) = manual_waiter(false);
        let options = WaitOptions::timeout(Duration::from_secs(3));
        assert!(!waiter.wait_for_bool(|| Some(false), options).unwrap());
        assert_eq!(clock.sleep_count(), 3);
        assert_eq!(out.text(), "...\n");

        assert!(!waiter.wait_for_bool(|| None::<bool>, options).unwrap());
        assert!(!waiter.wait_for_bool(|| json!(false), options).unwrap());

        let mut head = 0u32;
        let reached = waiter
            .wait_for_bool(
                || {
                    head += 1;
                    Some(head >= 3)
                },
                options,
            )
            .unwrap();
        assert!(reached);
        assert_eq!(head, 3);
    }

    #[test]
    fn test_unbounded_timeout_does_not_overflow() {
        let (waiter, clock, _out) = manual_waiter(false);
        let options = WaitOptions::timeout(Duration::MAX);
        assert_eq!(waiter.wait_for_value(|| Some(1u8), options).unwrap(), Some(1));

        let mut attempts = 0;
        let value = waiter
            .wait_for_value(
                || {
                    attempts += 1;
                    (attempts == 3).then_some(attempts)
                },
                options,
            )
            .unwrap();
        assert_eq!(value, Some(3));
        assert_eq!(clock.sleep_count(), 2);
    }

    #[test]
    fn test_wait_for_bool_with_arg_passes_timeout() {
        let (waiter, _clock, _out) = manual_waiter(false);
        let options = WaitOptions::timeout(Duration::from_secs(7));
        let mut seen = Vec::new();
        let ok = waiter
            .wait_for_bool_with_arg(
                |target: &u64, timeout| {
                    seen.push(timeout);
                    *target == 12
                },
                &12u64,
                options,
            )
            .unwrap();
        assert!(ok);
        assert_eq!(seen, vec![Some(Duration::from_secs(7))]);
    }

    #[test]
    fn test_system_clock_short_wait() {
        let waiter = Waiter::new(false).with_progress_writer(Captured::default());
        let options = WaitOptions::timeout(Duration::from_millis(60))
            .with_interval(Duration::from_millis(10));
        let start = std::time::Instant::now();
        assert_eq!(waiter.wait_for_value(|| None::<u8>, options).unwrap(), None);
        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
