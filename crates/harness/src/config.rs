//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sysio_harness_common::{Error, Result};

/// Test harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding the toolchain binaries
    pub bin_dir: PathBuf,

    /// Root directory for per-run logs and node data
    pub log_root: PathBuf,

    /// Name of this run; defaults to the invoking program's file stem
    pub run_name: Option<String>,

    /// Verbose progress reporting instead of progress dots
    pub debug: bool,

    /// Timeout for system contract / bootstrap waits
    pub system_wait_timeout_secs: u64,

    /// Timeout for waiting on irreversibility
    pub irreversible_timeout_secs: u64,

    /// Toolchain binary names
    pub binaries: BinariesConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
            log_root: default_log_root(),
            run_name: None,
            debug: false,
            system_wait_timeout_secs: 90,
            irreversible_timeout_secs: 60,
            binaries: BinariesConfig::default(),
        }
    }
}

/// Names of the toolchain executables inside `bin_dir`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinariesConfig {
    /// CLI client
    pub client: String,

    /// Arguments always passed to the CLI client
    pub client_args: Vec<String>,

    /// Block log and miscellaneous utility
    pub util: String,

    /// Wallet daemon
    pub wallet: String,

    /// Node server daemon
    pub server: String,
}

impl Default for BinariesConfig {
    fn default() -> Self {
        Self {
            client: "clio".to_string(),
            client_args: vec!["--no-auto-kiod".to_string()],
            util: "sys-util".to_string(),
            wallet: "kiod".to_string(),
            server: "nodeop".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| Error::InvalidConfig(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = bin_dir.into();
        self
    }

    pub fn with_log_root(mut self, log_root: impl Into<PathBuf>) -> Self {
        self.log_root = log_root.into();
        self
    }

    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = Some(run_name.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn client_path(&self) -> PathBuf {
        self.bin_dir.join(&self.binaries.client)
    }

    pub fn util_path(&self) -> PathBuf {
        self.bin_dir.join(&self.binaries.util)
    }

    pub fn wallet_path(&self) -> PathBuf {
        self.bin_dir.join(&self.binaries.wallet)
    }

    pub fn server_path(&self) -> PathBuf {
        self.bin_dir.join(&self.binaries.server)
    }

    pub fn system_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.system_wait_timeout_secs)
    }

    pub fn irreversible_timeout(&self) -> Duration {
        Duration::from_secs(self.irreversible_timeout_secs)
    }

    /// Run name, derived from the invoking program when not configured
    pub fn resolved_run_name(&self) -> String {
        self.run_name.clone().unwrap_or_else(default_run_name)
    }
}

/// `<workspace>/bin`, next to the `crates/` directory
fn default_bin_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(|root| root.join("bin"))
        .unwrap_or_else(|| PathBuf::from("bin"))
}

fn default_log_root() -> PathBuf {
    std::env::current_dir()
        .and_then(|cwd| cwd.canonicalize())
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("TestLogs")
}

/// File name of the running program with its last extension removed
fn default_run_name() -> String {
    std::env::args_os()
        .next()
        .map(PathBuf::from)
        .and_then(|program| program.file_name().map(|n| n.to_string_lossy().into_owned()))
        .map(|name| match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name,
        })
        .unwrap_or_else(|| "harness".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.system_wait_timeout(), Duration::from_secs(90));
        assert_eq!(config.irreversible_timeout(), Duration::from_secs(60));
        assert!(config.client_path().ends_with("bin/clio"));
        assert!(config.server_path().ends_with("bin/nodeop"));
        assert!(config.log_root.ends_with("TestLogs"));
        assert_eq!(config.binaries.client_args, vec!["--no-auto-kiod"]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.binaries.util, "sys-util");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.toml");
        std::fs::write(
            &path,
            "bin_dir = \"/opt/sysio/bin\"\ndebug = true\n\n[binaries]\nserver = \"nodeop-dev\"\n",
        )
        .unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert!(config.debug);
        assert_eq!(config.server_path(), PathBuf::from("/opt/sysio/bin/nodeop-dev"));
        assert_eq!(config.client_path(), PathBuf::from("/opt/sysio/bin/clio"));
        assert_eq!(config.irreversible_timeout_secs, 60);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("harness.toml");
        let config = HarnessConfig::default().with_run_name("restart_test").with_debug(true);
        config.save(&path).unwrap();

        let loaded = HarnessConfig::load(&path).unwrap();
        assert_eq!(loaded.resolved_run_name(), "restart_test");
        assert!(loaded.debug);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.toml");
        std::fs::write(&path, "debug = \"maybe\"").unwrap();
        assert!(matches!(HarnessConfig::load(&path), Err(Error::InvalidConfig(_))));
    }
}
