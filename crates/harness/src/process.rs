//! Subprocess invocation
//!
//! Every command run through a [`Session`] is executed synchronously with
//! both output streams captured, and recorded in the session's subprocess
//! log whether it succeeded or not.

use serde_json::Value;
use std::ffi::OsStr;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::session::{timestamp, ProcessRecord, Session};
use sysio_harness_common::{to_json, Error, Result};

/// How a wrapped tool invocation reacts to the tool failing
#[derive(Debug, Clone, Default)]
pub struct ErrorPolicy {
    /// Return the process error to the caller
    pub throw_exception: bool,

    /// Do not log the failure
    pub silent_errors: bool,

    /// Report the failure and terminate the test run
    pub exit_on_error: bool,

    /// Extra context appended to failure messages
    pub context: Option<String>,
}

impl ErrorPolicy {
    /// Swallow failures without logging them
    pub fn silent() -> Self {
        Self {
            silent_errors: true,
            ..Self::default()
        }
    }

    /// Hand failures back to the caller
    pub fn throwing() -> Self {
        Self {
            throw_exception: true,
            ..Self::default()
        }
    }

    /// Terminate the run on failure
    pub fn exiting() -> Self {
        Self {
            exit_on_error: true,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Split a command line into arguments using POSIX shell quoting rules.
///
/// Supports single quotes, double quotes (with `\"`, `\\`, `\$` and `` \` ``
/// escapes) and backslash escapes outside quotes. No expansion is performed.
pub fn split_command_line(line: &str) -> Result<Vec<String>> {
    #[derive(PartialEq)]
    enum Quote {
        None,
        Single,
        Double,
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\' | '$' | '`')) => current.push(next),
                    Some('\n') => {}
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => {
                        return Err(Error::InvalidCommand(format!(
                            "trailing escape in `{}`",
                            line
                        )))
                    }
                },
                _ => current.push(c),
            },
            Quote::None => match c {
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                '\\' => match chars.next() {
                    Some('\n') => {}
                    Some(next) => {
                        current.push(next);
                        in_word = true;
                    }
                    None => {
                        return Err(Error::InvalidCommand(format!(
                            "trailing escape in `{}`",
                            line
                        )))
                    }
                },
                c if c.is_whitespace() => {
                    if in_word {
                        args.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                _ => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }

    if quote != Quote::None {
        return Err(Error::InvalidCommand(format!(
            "unterminated quote in `{}`",
            line
        )));
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

/// Pick the `pgrep` invocation that prints full command lines on this host
pub fn pgrep_command(server_name: &str) -> String {
    let help = Command::new("pgrep")
        .arg("--help")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).into_owned())
        .unwrap_or_default();

    let supports_a = regex::Regex::new("-a")
        .ok()
        .map(|re| re.is_match(&help))
        .unwrap_or(false);
    let opts = if supports_a { "-a" } else { "-fl" };
    format!("pgrep {} {}", opts, server_name)
}

fn join_argv<S: AsRef<OsStr>>(argv: &[S]) -> String {
    argv.iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Session {
    /// Run `argv` to completion and return its stdout.
    ///
    /// A non-zero exit is an [`Error::Process`] unless `ignore_error` is
    /// set, in which case the tool's stderr is returned instead.
    pub fn check_output<S: AsRef<OsStr>>(&self, argv: &[S], ignore_error: bool) -> Result<String> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::InvalidCommand("empty command".to_string()))?;
        let command = join_argv(argv);

        let start = timestamp();
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.as_ref().to_string_lossy().into_owned(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        self.subprocess_log().record(&ProcessRecord {
            start: &start,
            command: &command,
            stdout: &stdout,
            stderr: &stderr,
            stop: &timestamp(),
        })?;

        if output.status.success() {
            Ok(String::from_utf8(output.stdout)?)
        } else if ignore_error {
            Ok(String::from_utf8(output.stderr)?)
        } else {
            Err(Error::Process {
                code: output.status.code(),
                command,
                stdout: stdout.into_owned(),
                stderr: stderr.into_owned(),
            })
        }
    }

    /// Split `cmd` with shell quoting rules and run it
    pub fn run_cmd_return_str(&self, cmd: &str, trace: bool, ignore_error: bool) -> Result<String> {
        let argv = split_command_line(cmd)?;
        self.run_cmd_arr_return_str(&argv, trace, ignore_error)
    }

    pub fn run_cmd_arr_return_str<S: AsRef<OsStr>>(
        &self,
        argv: &[S],
        trace: bool,
        ignore_error: bool,
    ) -> Result<String> {
        let out = self.check_output(argv, ignore_error)?;
        if trace {
            info!("RAW > {}", out);
        }
        Ok(out)
    }

    /// Run `cmd` and parse the JSON document embedded in its stdout
    pub fn run_cmd_return_json(&self, cmd: &str, trace: bool, silent_errors: bool) -> Result<Value> {
        let argv = split_command_line(cmd)?;
        self.run_cmd_arr_return_json(&argv, trace, silent_errors)
    }

    pub fn run_cmd_arr_return_json<S: AsRef<OsStr>>(
        &self,
        argv: &[S],
        trace: bool,
        silent_errors: bool,
    ) -> Result<Value> {
        let out = self.check_output(argv, false)?;
        to_json(&out, trace, silent_errors)
    }

    /// Run the block-log/misc utility with `args` (a shell-quoted string).
    ///
    /// Returns `Ok(None)` when the utility fails and `policy` does not
    /// propagate the failure.
    pub fn process_util_cmd(&self, args: &str, desc: &str, policy: &ErrorPolicy) -> Result<Option<String>> {
        let mut argv = vec![self.config().util_path().to_string_lossy().into_owned()];
        argv.extend(split_command_line(args)?);
        if self.debug() {
            debug!("cmd: {}", argv.join(" "));
        }

        let start = Instant::now();
        match self.check_output(&argv, false) {
            Ok(out) => {
                if self.debug() {
                    debug!("cmd Duration: {:.3} sec", start.elapsed().as_secs_f64());
                }
                Ok(Some(out))
            }
            Err(err) => self.apply_error_policy(err, policy, |stderr| {
                format!(
                    "Failure during \"{}\". Error message: {}. cmd Duration={:.3} sec. {}",
                    desc,
                    stderr,
                    start.elapsed().as_secs_f64(),
                    policy
                        .context
                        .as_deref()
                        .map(|c| format!("Context: {}", c))
                        .unwrap_or_default()
                )
            }),
        }
    }

    /// Route a failed tool invocation through `policy`.
    ///
    /// Only process failures are subject to the policy; spawn, JSON and I/O
    /// errors always propagate.
    pub(crate) fn apply_error_policy<T, F>(&self, err: Error, policy: &ErrorPolicy, describe: F) -> Result<Option<T>>
    where
        F: FnOnce(&str) -> String,
    {
        let stderr = match &err {
            Error::Process { stderr, .. } => stderr.clone(),
            _ => return Err(err),
        };
        if policy.throw_exception {
            return Err(err);
        }
        if !policy.silent_errors {
            let msg = describe(stderr.trim_end());
            if policy.exit_on_error {
                self.cmd_error(&msg, 0);
                self.error_exit(&msg, 1);
            } else {
                error!("ERROR: {}", msg);
            }
        }
        Ok(None)
    }

    /// Client argv: binary path, fixed client arguments, then `args`
    pub fn client_command<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let config = self.config();
        let mut argv = vec![config.client_path().to_string_lossy().into_owned()];
        argv.extend(config.binaries.client_args.iter().cloned());
        argv.extend(args.iter().map(|a| a.as_ref().to_string()));
        argv
    }

    pub fn run_client<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let argv = self.client_command(args);
        self.run_cmd_arr_return_str(&argv, self.debug(), false)
    }

    pub fn run_client_json<S: AsRef<str>>(&self, args: &[S]) -> Result<Value> {
        let argv = self.client_command(args);
        self.run_cmd_arr_return_json(&argv, self.debug(), false)
    }

    /// Full version string reported by the node server, newlines removed
    pub fn server_version(&self) -> Result<String> {
        let program = self.config().server_path();
        let output = Command::new(&program)
            .arg("--full-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.display().to_string(),
                source,
            })?;
        Ok(String::from_utf8_lossy(&output.stdout).replace('\n', ""))
    }
}
