//! External command-line tools: discovery on `PATH` and bounded execution.

use deck_core::{Error, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default time budget for a single tool invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// An executable found on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    /// Name it was looked up by.
    pub name: String,
    /// Resolved executable path.
    pub path: PathBuf,
}

impl Tool {
    /// Look up a single executable.
    pub fn find(name: &str) -> Option<Self> {
        match which::which(name) {
            Ok(path) => {
                log::debug!("Found {} at {}", name, path.display());
                Some(Self {
                    name: name.to_string(),
                    path,
                })
            }
            Err(_) => {
                log::debug!("{} not found on PATH", name);
                None
            }
        }
    }

    /// Return the first of `names` that is installed.
    pub fn find_first(names: &[&str]) -> Option<Self> {
        names.iter().find_map(|name| Self::find(name))
    }
}

/// Runs external tools with a timeout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ToolRunner {
    /// Create a runner with the default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The timeout in use.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `tool` with `args` and wait for it to finish.
    ///
    /// Standard output is discarded; standard error is captured for the
    /// failure message. If the tool outlives the timeout it is killed and
    /// [`Error::ToolTimedOut`] is returned.
    pub fn run<I, S>(&self, tool: &Tool, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run_program(&tool.name, &tool.path, args)
    }

    fn run_program<I, S>(&self, name: &str, program: &Path, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a timeout also reaches helpers the tool spawns.
            command.process_group(0);
        }
        log::info!("Running {:?}", command);

        let mut child = command.spawn().map_err(|e| Error::ToolFailed {
            tool: name.to_string(),
            detail: format!("could not start: {}", e),
        })?;

        // Read stderr while waiting; the tool blocks once the pipe is full.
        let stderr = child.stderr.take();
        let drain = thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf);
            }
            buf
        });

        match child.wait_timeout(self.timeout)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => {
                let stderr = drain.join().unwrap_or_default();
                Err(Error::ToolFailed {
                    tool: name.to_string(),
                    detail: format!("exited with {}: {}", status, stderr.trim()),
                })
            }
            None => {
                log::warn!("{} exceeded {:?}, killing it", name, self.timeout);
                kill_group(&mut child);
                Err(Error::ToolTimedOut {
                    tool: name.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

/// Kill a child started by [`ToolRunner`] together with its process group, then reap it.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: killpg only sends a signal; the group id is the child's pid.
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_find_missing_tool() {
        assert!(Tool::find("definitely-not-a-real-tool-4242").is_none());
        assert!(Tool::find_first(&["definitely-not-a-real-tool-4242"]).is_none());
    }

    #[test]
    fn test_successful_run() {
        let sh = Tool::find("sh").expect("sh should be installed");
        ToolRunner::new().run(&sh, ["-c", "exit 0"]).unwrap();
    }

    #[test]
    fn test_failure_reports_stderr() {
        let sh = Tool::find("sh").expect("sh should be installed");
        let err = ToolRunner::new()
            .run(&sh, ["-c", "echo broken >&2; exit 3"])
            .unwrap_err();

        match err {
            Error::ToolFailed { tool, detail } => {
                assert_eq!(tool, "sh");
                assert!(detail.contains("broken"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_timeout_kills_process() {
        let sh = Tool::find("sh").expect("sh should be installed");
        let runner = ToolRunner::new().with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = runner.run(&sh, ["-c", "sleep 10"]).unwrap_err();

        assert!(matches!(err, Error::ToolTimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_kills_spawned_helpers() {
        let sh = Tool::find("sh").expect("sh should be installed");
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("helper.pid");
        let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());

        let err = ToolRunner::new()
            .with_timeout(Duration::from_millis(300))
            .run(&sh, ["-c", script.as_str()])
            .unwrap_err();
        assert!(matches!(err, Error::ToolTimedOut { .. }));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let alive = || {
            Command::new("kill")
                .args(["-0", pid])
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        };
        // The orphaned helper is reaped by init shortly after the kill.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while alive() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert!(!alive(), "helper process {} survived the timeout", pid);
    }
}
