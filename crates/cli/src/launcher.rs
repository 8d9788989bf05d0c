use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::client::ControlClient;
use crate::config::LauncherConfig;
use crate::discovery::read_record;
use crate::settings::{LaunchTarget, PlatformSettings};

/// Interval between discovery checks while the main application starts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("could not determine the per-user config directory")]
    NoConfigDir,

    #[error("main executable `{}` does not exist", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("unable to start the main executable `{}`", .path.display())]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("main application exited ({0}) before it became ready")]
    ExitedEarly(ExitStatus),

    #[error("main application did not become ready within {}s", .0.as_secs_f32())]
    TimedOut(Duration),
}

/// Everything needed to find or start the main application.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub discovery_path: PathBuf,
    pub target: LaunchTarget,
    /// `None` waits for as long as the launched process is alive.
    pub ready_timeout: Option<Duration>,
}

impl LaunchPlan {
    pub fn resolve(
        platform: &impl PlatformSettings,
        config: &LauncherConfig,
        launcher_dir: &Path,
    ) -> Result<Self, LaunchError> {
        let discovery_path = platform.discovery_file_path().ok_or(LaunchError::NoConfigDir)?;

        let mut target = platform.launch_target(launcher_dir);
        if let Some(exe) = &config.main_executable {
            target.program = exe.clone();
            target.args = config.main_args.iter().map(Into::into).collect();
        }

        Ok(Self { discovery_path, target, ready_timeout: config.ready_timeout() })
    }
}

/// Directory holding the running launcher binary.
pub fn launcher_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate the launcher executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent()
        .map(Path::to_path_buf)
        .context("launcher executable has no parent directory")
}

/// A reachable main application.
#[derive(Debug, Clone)]
pub struct RunningApp {
    pub client: ControlClient,
    /// Process id from the discovery record.
    pub pid: u32,
    /// Process id of the instance this run started, if it started one.
    pub launched_pid: Option<u32>,
}

/// Return a live main application, starting one if needed.
pub async fn ensure_running(plan: &LaunchPlan) -> Result<RunningApp> {
    if let Some(app) = discover(&plan.discovery_path).await? {
        debug!(url = %app.client.base_url(), pid = app.pid, "main application already running");
        return Ok(app);
    }

    let mut child = spawn_main_process(&plan.target)?;
    info!(
        pid = child.id(),
        program = %plan.target.program.display(),
        "started main application"
    );
    wait_until_ready(&plan.discovery_path, &mut child, plan.ready_timeout).await
}

/// The recorded instance, if the record exists and it answers pings.
pub async fn discover(discovery_path: &Path) -> Result<Option<RunningApp>> {
    let Some(record) = read_record(discovery_path) else {
        return Ok(None);
    };
    let client = ControlClient::new(record.base_url)?;
    if client.ping().await {
        Ok(Some(RunningApp { client, pid: record.pid, launched_pid: None }))
    } else {
        debug!(pid = record.pid, "discovery record is stale");
        Ok(None)
    }
}

fn spawn_main_process(target: &LaunchTarget) -> Result<Child, LaunchError> {
    let mut command = Command::new(&target.program);
    command.args(&target.args);
    command.envs(target.env.iter().cloned());
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());
    detach(&mut command);

    command.spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LaunchError::ExecutableNotFound(target.program.clone())
        } else {
            LaunchError::SpawnFailed { path: target.program.clone(), source }
        }
    })
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    // Own process group: a Ctrl-C aimed at the launcher must not reach the app.
    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}

async fn wait_until_ready(
    discovery_path: &Path,
    child: &mut Child,
    ready_timeout: Option<Duration>,
) -> Result<RunningApp> {
    let started = Instant::now();
    let launched_pid = child.id();

    loop {
        if let Some(app) = discover(discovery_path).await? {
            if app.pid != launched_pid {
                debug!(recorded = app.pid, launched = launched_pid, "discovery pid differs");
            }
            info!(url = %app.client.base_url(), pid = app.pid, "main application is ready");
            return Ok(RunningApp { launched_pid: Some(launched_pid), ..app });
        }

        if let Some(status) =
            child.try_wait().context("failed to check the main application process")?
        {
            return Err(LaunchError::ExitedEarly(status).into());
        }

        if let Some(limit) = ready_timeout {
            if started.elapsed() >= limit {
                return Err(LaunchError::TimedOut(limit).into());
            }
        }

        sleep(POLL_INTERVAL).await;
    }
}
