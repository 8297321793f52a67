//! Node server and wallet processes launched by a test

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{info, warn};

use crate::session::Session;
use crate::wait::{WaitOptions, Waiter};
use sysio_harness_common::{Error, NodeId, Result, ShutdownSignal, SyncStrategy};

/// Handle to a running node server or wallet daemon
///
/// The process is killed when the handle is dropped.
pub struct NodeProcess {
    name: String,
    child: Child,
}

impl NodeProcess {
    /// Start the node server for `node`.
    ///
    /// Output goes to `stdout.txt` / `stderr.txt` in the node's data
    /// directory, which is created if needed.
    pub fn launch(session: &Session, node: NodeId, sync: SyncStrategy, extra_args: &[&str]) -> Result<Self> {
        let data_dir = session.node_data_dir(node, None, false);
        let config_dir = session.node_config_dir(node, None, false);
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&config_dir)?;

        let mut cmd = Command::new(session.config().server_path());
        cmd.arg("--data-dir")
            .arg(&data_dir)
            .arg("--config-dir")
            .arg(&config_dir);
        if !sync.arg().is_empty() {
            cmd.arg(sync.arg());
        }
        cmd.args(extra_args);

        Self::spawn(node.dir_name(), cmd, &data_dir)
    }

    /// Start the wallet daemon on `http_address` with its wallets in
    /// `wallet_dir`
    pub fn launch_wallet(session: &Session, wallet_dir: &Path, http_address: &str) -> Result<Self> {
        fs::create_dir_all(wallet_dir)?;
        let mut cmd = Command::new(session.config().wallet_path());
        cmd.arg("--wallet-dir")
            .arg(wallet_dir)
            .arg("--http-server-address")
            .arg(http_address);

        Self::spawn(session.config().binaries.wallet.clone(), cmd, wallet_dir)
    }

    fn spawn(name: String, mut cmd: Command, output_dir: &Path) -> Result<Self> {
        let stdout = File::create(output_dir.join("stdout.txt"))?;
        let stderr = File::create(output_dir.join("stderr.txt"))?;
        cmd.stdin(Stdio::null()).stdout(stdout).stderr(stderr);

        let program = cmd.get_program().to_string_lossy().into_owned();
        let child = cmd.spawn().map_err(|source| Error::Spawn { program, source })?;
        info!("Launched {} (pid: {})", name, child.id());
        Ok(Self { name, child })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Send `signal` to the process
    pub fn signal(&self, signal: Signal) -> Result<()> {
        let pid = Pid::from_raw(self.child.id() as i32);
        kill(pid, signal).map_err(|e| Error::Signal(format!("{} to {}: {}", signal, self.name, e)))
    }

    /// Ask the process to stop; does not wait for it
    pub fn stop(&self, how: ShutdownSignal) -> Result<()> {
        info!("Stopping {} (pid: {}) with {}", self.name, self.pid(), how);
        let signal = match how {
            ShutdownSignal::Kill => Signal::SIGKILL,
            ShutdownSignal::Term => Signal::SIGTERM,
        };
        self.signal(signal)
    }

    /// Wait up to `timeout` for the process to exit, returning its status
    pub fn wait_for_exit(&mut self, waiter: &Waiter, timeout: Duration) -> Result<Option<ExitStatus>> {
        let child = &mut self.child;
        wait_for_status(waiter, || child.try_wait(), timeout)
    }
}

// A failing `try_wait` ends the wait with its error
fn wait_for_status<F>(waiter: &Waiter, mut try_wait: F, timeout: Duration) -> Result<Option<ExitStatus>>
where
    F: FnMut() -> std::io::Result<Option<ExitStatus>>,
{
    let status = waiter.wait_for_value(
        || try_wait().transpose(),
        WaitOptions::timeout(timeout).with_interval(Duration::from_millis(100)),
    )?;
    Ok(status.transpose()?)
}

impl Drop for NodeProcess {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("Killing {} (pid: {}) on drop", self.name, self.pid());
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::sync::Arc;

    fn quiet_waiter() -> (Waiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let waiter = Waiter::new(false)
            .with_clock(clock.clone())
            .with_progress_writer(io::sink());
        (waiter, clock)
    }

    #[test]
    fn test_try_wait_error_ends_wait() {
        let (waiter, clock) = quiet_waiter();
        let result = wait_for_status(
            &waiter,
            || Err(io::Error::new(io::ErrorKind::Other, "bad child handle")),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_status_after_some_polls() {
        let (waiter, clock) = quiet_waiter();
        let mut polls = 0;
        let status = wait_for_status(
            &waiter,
            || {
                polls += 1;
                Ok((polls == 3).then(|| ExitStatus::from_raw(0)))
            },
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(status.map(|s| s.success()), Some(true));
        assert_eq!(clock.sleep_count(), 2);
    }

    #[test]
    fn test_still_running_times_out() {
        let (waiter, _clock) = quiet_waiter();
        let status = wait_for_status(&waiter, || Ok(None), Duration::from_secs(1)).unwrap();
        assert!(status.is_none());
    }
}
