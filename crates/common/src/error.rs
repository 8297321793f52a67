//! Error types for the sysio test harness

use thiserror::Error;

/// Result type alias using the harness Error
pub type Result<T> = std::result::Result<T, Error>;

/// Harness error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Received empty JSON response")]
    EmptyJson,

    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A subprocess exited unsuccessfully. Both captured streams are kept so
    /// callers can report what the tool printed.
    #[error("Command `{command}` {}", describe_exit(.code))]
    Process {
        code: Option<i32>,
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid command line: {0}")]
    InvalidCommand(String),

    #[error("Wait reached the default {seconds} second timeout")]
    DefaultTimeoutElapsed { seconds: u64 },

    #[error("Unknown chain sync strategy: {0}")]
    UnknownSyncStrategy(String),

    #[error("Unknown block log action: {0}")]
    UnknownBlockLogAction(String),

    #[error("Unknown signal tag: {0}")]
    UnknownSignal(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Signal error: {0}")]
    Signal(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("returned non-zero exit status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl Error {
    /// Captured stderr of a failed subprocess, if this is a process error
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::Process { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Exit code of a failed subprocess, if it exited normally
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Process { code, .. } => *code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_display() {
        let err = Error::Process {
            code: Some(3),
            command: "clio get info".to_string(),
            stdout: String::new(),
            stderr: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command `clio get info` returned non-zero exit status 3"
        );
        assert_eq!(err.stderr(), Some("connection refused"));
        assert_eq!(err.exit_code(), Some(3));
    }

    #[test]
    fn test_signalled_process_error_display() {
        let err = Error::Process {
            code: None,
            command: "nodeop".to_string(),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(err.to_string().ends_with("was terminated by a signal"));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_default_timeout_message() {
        let err = Error::DefaultTimeoutElapsed { seconds: 60 };
        assert_eq!(err.to_string(), "Wait reached the default 60 second timeout");
    }
}
