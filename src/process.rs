//! External command execution.
//!
//! Everything the manager does to the outside world goes through
//! [`ToolRunner`], so the install flow can be driven by a fake in tests.
//! The system implementation bounds every command with a timeout.

use crate::error::{HabitatError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;
use wait_timeout::ChildExt;

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.status {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }

    /// Last non-empty stdout line, ignoring warnings printed before it
    pub fn last_line(&self) -> Option<&str> {
        self.stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last()
    }

    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

pub trait ToolRunner {
    /// Run a command to completion and capture its output.
    fn run(&self, program: &Path, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput>;

    /// Resolve an executable on PATH.
    fn which(&self, name: &str) -> Option<PathBuf>;
}

pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
        let shown = display_command(program, args);
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(command = %shown, cwd = ?cwd, "spawning");
        let started = Instant::now();
        let mut child = cmd.spawn()?;

        // Drain pipes on helper threads so a chatty npm cannot fill them
        // and stall before the timeout fires.
        let stdout_reader = child.stdout.take().map(|pipe| std::thread::spawn(move || std::io::read_to_string(pipe)));
        let stderr_reader = child.stderr.take().map(|pipe| std::thread::spawn(move || std::io::read_to_string(pipe)));

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let stdout = join_reader(stdout_reader)?;
                let stderr = join_reader(stderr_reader)?;
                debug!(
                    command = %shown,
                    status = ?status.code(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "finished"
                );
                Ok(CommandOutput {
                    status: status.code(),
                    stdout,
                    stderr,
                })
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(HabitatError::CommandTimedOut {
                    command: shown,
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

fn join_reader(reader: Option<std::thread::JoinHandle<std::io::Result<String>>>) -> Result<String> {
    match reader {
        Some(handle) => match handle.join() {
            Ok(text) => Ok(text?),
            Err(_) => Ok(String::new()),
        },
        None => Ok(String::new()),
    }
}

pub fn display_command(program: &Path, args: &[&str]) -> String {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());

    if args.is_empty() {
        name
    } else {
        format!("{} {}", name, args.join(" "))
    }
}
