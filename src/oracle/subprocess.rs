//! The production oracle: invokes an external tester executable as a
//! subprocess over each probe's serialised candidate (§6, "Tester
//! contract").

use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use super::Oracle;
use crate::core::{Probe, ProbeId, Verdict};
use crate::error::{EngineError, Result};
use crate::scheduler::cancel::CancellationToken;
use crate::splitter::SplitInput;
use crate::workspace::Workspace;

/// Maximum number of stdout/stderr bytes retained per probe for
/// `--verbose` diagnostics; the rest is read and discarded so a chatty
/// tester can't grow memory unbounded.
const OUTPUT_CAPTURE_CAP: usize = 8 * 1024;

/// Runs the caller-supplied tester executable against each probe's
/// serialised candidate.
///
/// Each probe spawns its own child process in its own process group, so
/// cancellation can target the whole group with a SIGTERM-then-SIGKILL
/// escalation instead of just the direct child.
pub struct SubprocessOracle {
    tester: PathBuf,
    workspace: Arc<Workspace>,
    splitter: Arc<SplitInput>,
    timeout: Option<Duration>,
    kill_grace: Duration,
    cleanup: bool,
    retained_winner: Mutex<Option<ProbeId>>,
}

impl SubprocessOracle {
    /// Builds an oracle invoking `tester`, rejecting it up front if it
    /// doesn't look like an executable file (§7, `InputError`).
    ///
    /// `cleanup` mirrors `--cleanup`: when `true`, every probe's workspace
    /// directory is removed as soon as its verdict is known. When `false`
    /// (the default per §9's resolved Open Question), a losing probe is
    /// still removed immediately, but the most recent interesting probe's
    /// directory is retained until a later interesting probe supersedes it.
    pub fn new(
        tester: PathBuf,
        workspace: Arc<Workspace>,
        splitter: Arc<SplitInput>,
        timeout: Option<Duration>,
        kill_grace: Duration,
        cleanup: bool,
    ) -> Result<Self> {
        if !is_executable(&tester) {
            return Err(EngineError::Input {
                message: format!("tester {} is not an executable file", tester.display()),
            });
        }
        Ok(Self {
            tester,
            workspace,
            splitter,
            timeout,
            kill_grace,
            cleanup,
            retained_winner: Mutex::new(None),
        })
    }

    async fn wait_with_timeout(&self, child: &mut Child) -> Option<std::io::Result<std::process::ExitStatus>> {
        match self.timeout {
            Some(duration) => tokio::time::timeout(duration, child.wait()).await.ok(),
            None => Some(child.wait().await),
        }
    }

    /// Sends `SIGTERM` to the tester's process group, waits up to
    /// `kill_grace` for it to exit, then escalates to `SIGKILL` and reaps
    /// the child so it doesn't linger as a zombie (§5, "implementations
    /// SHOULD escalate").
    async fn kill_with_escalation(&self, child: &mut Child) {
        if let Some(pid) = child.id() {
            let pgid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            let _ = signal::killpg(pgid, Signal::SIGTERM);
            if tokio::time::timeout(self.kill_grace, child.wait()).await.is_ok() {
                return;
            }
            let _ = signal::killpg(pgid, Signal::SIGKILL);
        }
        let _ = child.wait().await;
    }
}

#[async_trait]
impl Oracle for SubprocessOracle {
    async fn run(&self, probe: &Probe, cancel: CancellationToken) -> Verdict {
        let content = self.splitter.serialize(&probe.configuration);
        let candidate_path = match self.workspace.prepare_probe(&probe.id, &content) {
            Ok(path) => path,
            Err(source) => {
                tracing::warn!(probe = %probe.id, error = %source, "failed to prepare probe workspace");
                return Verdict::Uninteresting;
            }
        };
        #[allow(clippy::expect_used)]
        let probe_dir = candidate_path
            .parent()
            .expect("candidate file is always written inside its probe directory")
            .to_path_buf();

        let mut command = Command::new(&self.tester);
        command.arg(&candidate_path);
        command.current_dir(&probe_dir);
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        // SAFETY: setsid() is async-signal-safe and only affects the
        // forked child, giving it its own process group so SIGTERM/SIGKILL
        // can target the whole group rather than just the direct child.
        unsafe {
            command.pre_exec(|| nix::unistd::setsid().map(|_| ()).map_err(std::io::Error::from));
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                tracing::warn!(probe = %probe.id, tester = %self.tester.display(), error = %source, "failed to spawn tester");
                self.workspace.cleanup_probe(&probe.id);
                return Verdict::Uninteresting;
            }
        };

        // Pipes are drained on their own tasks, concurrently with the
        // wait below, not after it: a tester that writes more than the OS
        // pipe buffer before exiting would otherwise block on a full pipe
        // that nothing is reading, hanging the probe (and, without a
        // timeout, the whole run) regardless of whether it would
        // otherwise have exited successfully.
        let stdout_task = tokio::spawn(drain_capped(child.stdout.take()));
        let stderr_task = tokio::spawn(drain_capped(child.stderr.take()));

        let verdict = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.kill_with_escalation(&mut child).await;
                Verdict::Cancelled
            }
            outcome = self.wait_with_timeout(&mut child) => {
                match outcome {
                    Some(Ok(status)) if status.success() => Verdict::Interesting,
                    Some(Ok(_)) => Verdict::Uninteresting,
                    Some(Err(source)) => {
                        tracing::warn!(probe = %probe.id, error = %source, "tester wait failed, treating as crash");
                        Verdict::Uninteresting
                    }
                    None => {
                        self.kill_with_escalation(&mut child).await;
                        Verdict::Uninteresting
                    }
                }
            }
        };

        // The child's stdout/stderr are closed by now (it exited or was
        // killed above), so both readers have already hit EOF or are
        // about to.
        let stdout_buf = stdout_task.await.unwrap_or_default();
        let stderr_buf = stderr_task.await.unwrap_or_default();
        if !stdout_buf.is_empty() {
            tracing::debug!(probe = %probe.id, stdout = %String::from_utf8_lossy(&stdout_buf), "tester stdout");
        }
        if !stderr_buf.is_empty() {
            tracing::debug!(probe = %probe.id, stderr = %String::from_utf8_lossy(&stderr_buf), "tester stderr");
        }

        self.settle_workspace(&probe.id, verdict);
        verdict
    }
}

/// Fully drains `pipe` until EOF, retaining at most [`OUTPUT_CAPTURE_CAP`]
/// bytes and discarding the rest, so a chatty tester can neither block on
/// a full OS pipe buffer nor grow this process's memory unbounded.
async fn drain_capped<R>(pipe: Option<R>) -> Vec<u8>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let Some(mut pipe) = pipe else {
        return Vec::new();
    };
    let mut retained = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if retained.len() < OUTPUT_CAPTURE_CAP {
                    let take = n.min(OUTPUT_CAPTURE_CAP - retained.len());
                    retained.extend_from_slice(&chunk[..take]);
                }
            }
        }
    }
    retained
}

impl SubprocessOracle {
    /// Applies the run's workspace-retention policy to a settled probe.
    #[allow(clippy::expect_used)]
    fn settle_workspace(&self, probe_id: &ProbeId, verdict: Verdict) {
        if self.cleanup || verdict != Verdict::Interesting {
            self.workspace.cleanup_probe(probe_id);
            return;
        }
        let mut retained = self.retained_winner.lock().expect("retained-winner lock poisoned");
        if let Some(previous) = retained.replace(probe_id.clone()) {
            self.workspace.cleanup_probe(&previous);
        }
    }
}

fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
