// Optional launcher configuration: `<config dir>/launcher.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::settings::PlatformSettings;

pub const CONFIG_FILE_NAME: &str = "launcher.toml";
/// Overrides the main executable path from the config file and platform default.
pub const MAIN_EXE_ENV: &str = "EXTRATERM_MAIN_EXE";

const DEFAULT_READY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Start this executable instead of the platform default.
    pub main_executable: Option<PathBuf>,
    /// Arguments for `main_executable`. Ignored without it.
    pub main_args: Vec<String>,
    /// How long to wait for the main application to answer pings
    /// after launching it. `0` waits for as long as it keeps running.
    pub ready_timeout_secs: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            main_executable: None,
            main_args: Vec::new(),
            ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
        }
    }
}

impl LauncherConfig {
    /// Load from the platform config dir. Returns defaults if the file is
    /// missing; an unreadable or invalid file is logged and ignored.
    pub fn load(platform: &impl PlatformSettings) -> Self {
        let Some(path) = platform.config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)) else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring launcher config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Apply `EXTRATERM_MAIN_EXE` if set.
    pub fn with_env_overrides(self) -> Self {
        self.with_main_executable_override(std::env::var_os(MAIN_EXE_ENV).map(PathBuf::from))
    }

    fn with_main_executable_override(mut self, exe: Option<PathBuf>) -> Self {
        if let Some(exe) = exe.filter(|path| !path.as_os_str().is_empty()) {
            self.main_executable = Some(exe);
        }
        self
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        match self.ready_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
