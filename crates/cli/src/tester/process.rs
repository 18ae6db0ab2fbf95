//! Subprocess plumbing shared by the tester runners

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

use switchtest_common::{Error, Result};

/// A command line to launch, kept printable for logs and errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Prefix with `sudo` when `elevated` is set
    pub fn elevated(program: impl Into<String>, elevated: bool) -> Self {
        if elevated {
            Self::new("sudo").arg(program)
        } else {
            Self::new(program)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Spawn with stderr piped and stdout discarded
    pub fn spawn_capturing_stderr(&self) -> Result<Child> {
        debug!("Spawning: {}", self);
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ExternalProcess(format!("Failed to spawn {}: {}", self.program, e)))
    }

    /// Spawn with all output discarded
    pub fn spawn_quiet(&self) -> Result<Child> {
        debug!("Spawning: {}", self);
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ExternalProcess(format!("Failed to spawn {}: {}", self.program, e)))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Read a stream to EOF as lines, logging each at debug level
pub async fn collect_lines<R>(stream: R) -> std::io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    let mut captured = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end().to_string();
        debug!("{}", line);
        captured.push(line);
    }
    Ok(captured)
}

/// Stop a child: SIGTERM first, SIGKILL if it has not exited shortly after
pub async fn terminate(child: &mut Child) {
    debug!("Terminating process (pid: {:?})", child.id());

    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && tokio::time::timeout(Duration::from_millis(500), child.wait())
                    .await
                    .is_ok()
            {
                return;
            }
        }
    }

    let _ = child.kill().await;
}
