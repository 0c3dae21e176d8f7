use crate::command::SimCommand;
use crate::error::SimulationError;
use crate::error::SimulationResult;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tokio::process::Command;
use tracing::Instrument;

/// File the simulator's stdout is captured into.
pub const LOG_FILE: &str = "output";

/// Result of a simulator run that exited successfully.
#[derive(Debug)]
pub struct SimulationOutcome {
  pub status: ExitStatus,
  pub elapsed: Duration,
  pub log_path: PathBuf,
}

/// Runs the simulator in `dir` and waits for it to finish.
///
/// Stdout is written to `log_path`, stderr is forwarded to the log. A
/// non-zero exit is an error. `timeout` bounds both the process and the
/// draining of its stderr, so descendants that outlive the simulator still
/// count against it. On timeout the simulator's whole process group is
/// killed.
pub async fn run_simulation(
  sim: &SimCommand,
  dir: &Path,
  log_path: &Path,
  timeout: Duration,
) -> SimulationResult<SimulationOutcome> {
  let log = File::create(log_path).map_err(|source| SimulationError::OpenLog {
    path: log_path.to_path_buf(),
    source,
  })?;

  let mut cmd = Command::new(&sim.command);
  cmd
    .args(&sim.args)
    .current_dir(dir)
    .stdin(Stdio::null())
    .stdout(Stdio::from(log))
    .stderr(Stdio::piped())
    .kill_on_drop(true);
  #[cfg(unix)]
  cmd.process_group(0);

  tracing::info!("{}", sim);
  tracing::debug!(cmd = ?cmd, "Spawning simulator");
  let started = Instant::now();
  let mut child = cmd.spawn().map_err(|source| SimulationError::Spawn {
    command: sim.to_string(),
    source,
  })?;
  // Leader of the simulator's process group; `id()` is gone once reaped.
  let pgid = child.id();

  let stderr = child.stderr.take().ok_or(SimulationError::PipeStderr)?;
  let mut stderr_task = tokio::spawn(
    read_and_log_stderr(stderr).instrument(tracing::info_span!("stderr_handler", target = "simulator")),
  );

  let finished = tokio::time::timeout(timeout, async {
    let status = child.wait().await.map_err(SimulationError::Wait)?;
    (&mut stderr_task)
      .await
      .map_err(SimulationError::StderrTask)??;
    Ok::<_, SimulationError>(status)
  })
  .await;

  let status = match finished {
    Ok(status) => status?,
    Err(_) => {
      tracing::error!(secs = timeout.as_secs(), "Simulator timed out, killing it");
      stderr_task.abort();
      if let Some(pgid) = pgid {
        kill_process_group(pgid).await;
      }
      if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "Simulator already exited");
      }
      return Err(SimulationError::Timeout {
        command: sim.to_string(),
        secs: timeout.as_secs(),
      });
    }
  };

  let elapsed = started.elapsed();
  if !status.success() {
    tracing::error!(code = ?status.code(), "Simulator process failed");
    return Err(SimulationError::NonZeroExit {
      command: sim.to_string(),
      code: status.code(),
    });
  }

  tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "Simulator finished");
  Ok(SimulationOutcome {
    status,
    elapsed,
    log_path: log_path.to_path_buf(),
  })
}

/// Sends SIGKILL to every process in the group led by `pgid`.
#[cfg(unix)]
async fn kill_process_group(pgid: u32) {
  let result = Command::new("kill")
    .arg("-KILL")
    .arg("--")
    .arg(format!("-{}", pgid))
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .await;

  match result {
    Ok(status) if status.success() => tracing::debug!(pgid, "Killed simulator process group"),
    Ok(status) => tracing::warn!(pgid, code = ?status.code(), "Failed to kill simulator process group"),
    Err(e) => tracing::warn!(pgid, error = %e, "Failed to run kill for simulator process group"),
  }
}

#[cfg(not(unix))]
async fn kill_process_group(_pgid: u32) {}

/// Reads lines from the simulator's stderr and logs them.
async fn read_and_log_stderr<R: AsyncRead + Unpin>(stream: R) -> SimulationResult<()> {
  let mut reader = BufReader::new(stream).lines();

  while let Some(line) = reader
    .next_line()
    .await
    .map_err(SimulationError::ReadStderr)?
  {
    tracing::warn!("{}", line);
  }
  Ok(())
}
