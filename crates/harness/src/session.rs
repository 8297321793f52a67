//! Test session context
//!
//! A [`Session`] owns everything that lives for the length of one test run:
//! the configuration, the per-run data directory, the subprocess result log,
//! the polling waiter and the shutting-down flag. Dropping the session
//! flushes the log.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::config::HarnessConfig;
use crate::wait::Waiter;
use sysio_harness_common::Result;

/// Separator written before every subprocess record
pub const FILE_DIVIDER: &str =
    "=================================================================";

/// File name of the subprocess log inside the run directory
pub const SUBPROCESS_LOG_NAME: &str = "subprocess_results.log";

/// Current UTC time with microseconds, e.g. `2024-05-01T12:00:00.123456`
pub fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Date formatted for use in file names, e.g. `2024_05_01_12_00_00`
pub fn date_string(dt: &DateTime<Utc>) -> String {
    dt.format("%Y_%m_%d_%H_%M_%S").to_string()
}

/// One finished subprocess invocation
#[derive(Debug, Clone)]
pub struct ProcessRecord<'a> {
    pub start: &'a str,
    pub command: &'a str,
    pub stdout: &'a str,
    pub stderr: &'a str,
    pub stop: &'a str,
}

/// Append-only log of every subprocess the harness runs.
///
/// The file is created (truncated) on the first record of the run; parent
/// directories are created as needed.
pub struct SubprocessLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

#[derive(Default)]
struct LogState {
    writer: Option<BufWriter<File>>,
    created: bool,
}

impl SubprocessLog {
    pub fn new(run_dir: &Path) -> Self {
        Self {
            path: run_dir.join(SUBPROCESS_LOG_NAME),
            state: Mutex::new(LogState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, record: &ProcessRecord<'_>) -> Result<()> {
        let mut state = self.state.lock();
        if state.writer.is_none() {
            let file = self.open(state.created)?;
            state.writer = Some(BufWriter::new(file));
            state.created = true;
        }

        if let Some(writer) = state.writer.as_mut() {
            writeln!(writer, "{}", FILE_DIVIDER)?;
            writeln!(writer, "start={{{}}}", record.start)?;
            writeln!(writer, "cmd={{{}}}", record.command)?;
            writeln!(writer, "cout={{{}}}", record.stdout)?;
            writeln!(writer, "cerr={{{}}}", record.stderr)?;
            writeln!(writer, "stop={{{}}}", record.stop)?;
            writer.flush()?;
        }
        Ok(())
    }

    fn open(&self, append: bool) -> Result<File> {
        if let Some(dir) = self.path.parent() {
            if !dir.is_dir() {
                debug!("creating log dir {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        debug!("opening {}", self.path.display());
        let file = if append {
            OpenOptions::new().create(true).append(true).open(&self.path)?
        } else {
            File::create(&self.path)?
        };
        Ok(file)
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(writer) = self.state.lock().writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush and release the file handle; a later record reopens it for
    /// appending
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(mut writer) = state.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Context shared by every helper during one test run
pub struct Session {
    config: HarnessConfig,
    run_dir: PathBuf,
    waiter: Waiter,
    log: SubprocessLog,
    shutting_down: AtomicBool,
}

impl Session {
    /// Start a session. Nothing is created on disk until it is needed.
    pub fn open(config: HarnessConfig) -> Self {
        let run_dir = config.log_root.join(format!(
            "{}{}",
            config.resolved_run_name(),
            std::process::id()
        ));
        let waiter = Waiter::new(config.debug);
        let log = SubprocessLog::new(&run_dir);
        info!("Test session data in {}", run_dir.display());

        Self {
            config,
            run_dir,
            waiter,
            log,
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn with_waiter(mut self, waiter: Waiter) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    /// `<log_root>/<run_name><pid>`; holds node data, node config and the
    /// subprocess log
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    pub fn subprocess_log(&self) -> &SubprocessLog {
        &self.log
    }

    /// Mark the run as tearing down; [`Session::error_exit`] stops exiting
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Log `msg` with a backtrace and terminate the process with `code`.
    ///
    /// During shutdown the message is logged and the call returns instead.
    pub fn error_exit(&self, msg: &str, code: i32) {
        if self.is_shutting_down() {
            warn!("error_exit called during shutdown, ignoring. msg={}", msg);
            return;
        }
        error!("ERROR: {}", msg);
        eprintln!("{}", Backtrace::force_capture());
        if let Err(e) = self.flush() {
            warn!("Failed to flush subprocess log: {}", e);
        }
        std::process::exit(code);
    }

    /// Report a failed step, including the tool's exit code when non-zero
    pub fn cmd_error(&self, name: &str, code: i32) {
        error!("{}", failure_message(name, code));
    }

    pub fn flush(&self) -> Result<()> {
        self.log.flush()
    }

    /// End the session, flushing and closing the subprocess log
    pub fn close(self) -> Result<()> {
        self.log.close()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.log.close();
    }
}

fn failure_message(name: &str, code: i32) -> String {
    if code == 0 {
        format!("FAILURE - {}", name)
    } else {
        format!("FAILURE - {} returned error code {}", name, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session_in(dir: &Path) -> Session {
        Session::open(
            HarnessConfig::default()
                .with_log_root(dir)
                .with_run_name("session_test"),
        )
    }

    #[test]
    fn test_run_dir_uses_name_and_pid() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let expected = dir
            .path()
            .join(format!("session_test{}", std::process::id()));
        assert_eq!(session.run_dir(), expected);
        assert_eq!(
            session.subprocess_log().path(),
            expected.join(SUBPROCESS_LOG_NAME)
        );
        assert!(!expected.exists(), "run dir is created lazily");
    }

    #[test]
    fn test_log_record_format() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        session
            .subprocess_log()
            .record(&ProcessRecord {
                start: "t0",
                command: "clio get info",
                stdout: "{\"head_block_num\": 5}",
                stderr: "",
                stop: "t1",
            })
            .unwrap();

        let text = fs::read_to_string(session.subprocess_log().path()).unwrap();
        let expected = format!(
            "{}\nstart={{t0}}\ncmd={{clio get info}}\ncout={{{{\"head_block_num\": 5}}}}\ncerr={{}}\nstop={{t1}}\n",
            FILE_DIVIDER
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_log_appends_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        let record = ProcessRecord {
            start: "a",
            command: "true",
            stdout: "",
            stderr: "",
            stop: "b",
        };
        session.subprocess_log().record(&record).unwrap();
        session.subprocess_log().close().unwrap();
        session.subprocess_log().record(&record).unwrap();
        let path = session.subprocess_log().path().to_path_buf();
        session.close().unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.matches(FILE_DIVIDER).count(), 2);
    }

    #[test]
    fn test_error_exit_during_shutdown_returns() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        session.begin_shutdown();
        assert!(session.is_shutting_down());
        session.error_exit("node did not stop", 1);
    }

    #[test]
    fn test_failure_message() {
        assert_eq!(failure_message("get info", 0), "FAILURE - get info");
        assert_eq!(
            failure_message("get info", 2),
            "FAILURE - get info returned error code 2"
        );
    }

    #[test]
    fn test_date_string() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(date_string(&dt), "2024_03_07_09_05_01");
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp();
        let (_, micros) = ts.rsplit_once('.').unwrap();
        assert_eq!(micros.len(), 6);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
    }
}
