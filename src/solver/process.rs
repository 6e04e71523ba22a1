//! Solver subprocesses. A `SolverProcess` owns its child; dropping it kills
//! and reaps the child on every path, including errors half-way through
//! reading a transcript.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::error::SolverError;

/// Probe results keyed by command line, kept for the process lifetime.
static PROBES: Lazy<Mutex<HashMap<String, bool>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Program plus leading arguments, run without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SolverCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Whitespace-separated `program [args..]`, as written in the config.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let program = words.next()?;
        Some(Self {
            program: program.to_string(),
            args: words.map(str::to_string).collect(),
        })
    }

    fn build(&self, extra: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(extra)
            .env("FREECELL_SOLVER_QUIET", "1");
        cmd
    }
}

impl fmt::Display for SolverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub struct SolverProcess {
    child: Option<Child>,
    command: String,
}

impl SolverProcess {
    pub fn spawn(command: &SolverCommand, extra: &[String]) -> Result<Self, SolverError> {
        let child = command
            .build(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SolverError::Spawn {
                command: command.to_string(),
                source,
            })?;
        debug!(command = %command, pid = child.id(), "solver started");
        Ok(Self {
            child: Some(child),
            command: command.to_string(),
        })
    }

    fn child_mut(&mut self) -> io::Result<&mut Child> {
        self.child
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "solver already reaped"))
    }

    /// Write the board and close stdin. A solver that exits without
    /// reading its input is not an error here; its transcript decides.
    pub fn feed(&mut self, input: &str) -> io::Result<()> {
        let Some(mut stdin) = self.child_mut()?.stdin.take() else {
            return Ok(());
        };
        match stdin.write_all(input.as_bytes()) {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }

    pub fn output(&mut self) -> io::Result<BufReader<ChildStdout>> {
        self.child_mut()?
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "solver stdout already taken"))
    }

    /// Wait for a normal exit.
    pub fn finish(mut self) -> io::Result<ExitStatus> {
        let status = self.child_mut()?.wait()?;
        self.child = None;
        debug!(command = %self.command, %status, "solver exited");
        Ok(status)
    }
}

impl Drop for SolverProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

fn run_probe(command: &SolverCommand, banner: &dyn Fn(&str) -> bool) -> bool {
    let spawned = command
        .build(&["--help".to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let child = match spawned {
        Ok(child) => child,
        Err(err) => {
            debug!(command = %command, %err, "solver probe failed to start");
            return false;
        }
    };
    let mut process = SolverProcess {
        child: Some(child),
        command: command.to_string(),
    };
    let mut first = String::new();
    let read = process
        .output()
        .and_then(|mut out| out.read_line(&mut first));
    read.is_ok() && banner(first.trim_start())
}

/// `command --help` once per command line; later calls hit the cache.
pub fn probe(command: &SolverCommand, banner: &dyn Fn(&str) -> bool) -> bool {
    let key = command.to_string();
    let mut probes = PROBES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(&known) = probes.get(&key) {
        return known;
    }
    let available = run_probe(command, banner);
    info!(command = %key, available, "solver probe");
    probes.insert(key, available);
    available
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let cmd = SolverCommand::parse("  sh /tmp/fake solver ").unwrap();
        assert_eq!(cmd.program, "sh");
        assert_eq!(cmd.args, vec!["/tmp/fake".to_string(), "solver".to_string()]);
        assert_eq!(cmd.to_string(), "sh /tmp/fake solver");
        assert!(SolverCommand::parse("   ").is_none());
    }

    #[test]
    fn test_missing_binary_probes_unavailable_once() {
        let cmd = SolverCommand::new("/nonexistent/mdhint-test-solver");
        let banner = |line: &str| line.starts_with("fc-solve");
        assert!(!probe(&cmd, &banner));
        let cached = PROBES
            .lock()
            .map(|p| p.get(&cmd.to_string()).copied())
            .unwrap();
        assert_eq!(cached, Some(false));
        assert!(!probe(&cmd, &banner));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_is_reaped_after_early_drop() {
        let cmd = SolverCommand::new("sh").arg("-c").arg("cat >/dev/null; echo done");
        let mut process = SolverProcess::spawn(&cmd, &[]).unwrap();
        process.feed("board\n").unwrap();
        drop(process);

        let mut process = SolverProcess::spawn(&cmd, &[]).unwrap();
        process.feed("board\n").unwrap();
        let mut line = String::new();
        process.output().unwrap().read_line(&mut line).unwrap();
        assert_eq!(line.trim(), "done");
        assert!(process.finish().unwrap().success());
    }
}
