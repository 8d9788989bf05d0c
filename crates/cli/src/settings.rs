// Per-platform locations: config directory, discovery file, main executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Name of the discovery file inside the config directory.
pub const DISCOVERY_FILE_NAME: &str = "ipc.run";

/// How to start the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(OsString, OsString)>,
}

impl LaunchTarget {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new(), env: Vec::new() }
    }
}

pub trait PlatformSettings {
    /// Per-user directory the main application writes its state to.
    fn config_dir(&self) -> Option<PathBuf>;

    fn discovery_file_path(&self) -> Option<PathBuf> {
        self.config_dir().map(|dir| dir.join(DISCOVERY_FILE_NAME))
    }

    /// Main executable (and its arguments) relative to the launcher's own directory.
    fn main_executable(&self, launcher_dir: &Path) -> LaunchTarget;

    /// Extra environment for the launched process.
    fn child_environment(&self, launcher_dir: &Path) -> Vec<(OsString, OsString)>;

    fn launch_target(&self, launcher_dir: &Path) -> LaunchTarget {
        let mut target = self.main_executable(launcher_dir);
        target.env = self.child_environment(launcher_dir);
        target
    }
}

// ── Linux and other Unix ───────────────────────────────────────────

const UNIX_APP_DIR: &str = "extraterm";
const UNIX_EXE_NAME: &str = "extraterm";
const UNIX_LIB_DIR: &str = "lib";

#[derive(Debug, Clone)]
pub struct UnixSettings {
    config_home: Option<PathBuf>,
    library_path: Option<OsString>,
}

impl UnixSettings {
    pub fn from_env() -> Self {
        Self::new(dirs::config_dir(), std::env::var_os("LD_LIBRARY_PATH"))
    }

    pub fn new(config_home: Option<PathBuf>, library_path: Option<OsString>) -> Self {
        Self { config_home, library_path }
    }
}

impl PlatformSettings for UnixSettings {
    fn config_dir(&self) -> Option<PathBuf> {
        self.config_home.as_ref().map(|home| home.join(UNIX_APP_DIR))
    }

    fn main_executable(&self, launcher_dir: &Path) -> LaunchTarget {
        LaunchTarget::new(launcher_dir.join(UNIX_EXE_NAME))
    }

    fn child_environment(&self, launcher_dir: &Path) -> Vec<(OsString, OsString)> {
        let mut value = launcher_dir.join(UNIX_LIB_DIR).into_os_string();
        if let Some(existing) = self.library_path.as_ref().filter(|path| !path.is_empty()) {
            value.push(":");
            value.push(existing);
        }
        vec![(OsString::from("LD_LIBRARY_PATH"), value)]
    }
}

// ── macOS ──────────────────────────────────────────────────────────

const MACOS_APP_DIR: &str = "Library/Application Support/extraterm-qt";
const MACOS_QODE_PATH: &str = "node_modules/@nodegui/qode/binaries/qode";
const MACOS_MAIN_JS_PATH: &str = "main/dist/main.js";

#[derive(Debug, Clone)]
pub struct MacOsSettings {
    home: Option<PathBuf>,
}

impl MacOsSettings {
    pub fn from_env() -> Self {
        Self::new(dirs::home_dir())
    }

    pub fn new(home: Option<PathBuf>) -> Self {
        Self { home }
    }
}

impl PlatformSettings for MacOsSettings {
    fn config_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join(MACOS_APP_DIR))
    }

    fn main_executable(&self, launcher_dir: &Path) -> LaunchTarget {
        let mut target = LaunchTarget::new(launcher_dir.join(MACOS_QODE_PATH));
        target.args.push(launcher_dir.join(MACOS_MAIN_JS_PATH).into_os_string());
        target
    }

    fn child_environment(&self, _launcher_dir: &Path) -> Vec<(OsString, OsString)> {
        Vec::new()
    }
}

// ── Windows ────────────────────────────────────────────────────────

const WINDOWS_APP_DIR: &str = "extraterm";
const WINDOWS_EXE_NAME: &str = "extraterm_main.exe";

#[derive(Debug, Clone)]
pub struct WindowsSettings {
    app_data: Option<PathBuf>,
}

impl WindowsSettings {
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("APPDATA").map(PathBuf::from))
    }

    pub fn new(app_data: Option<PathBuf>) -> Self {
        Self { app_data }
    }
}

impl PlatformSettings for WindowsSettings {
    fn config_dir(&self) -> Option<PathBuf> {
        self.app_data.as_ref().map(|dir| dir.join(WINDOWS_APP_DIR))
    }

    fn main_executable(&self, launcher_dir: &Path) -> LaunchTarget {
        LaunchTarget::new(launcher_dir.join(WINDOWS_EXE_NAME))
    }

    fn child_environment(&self, _launcher_dir: &Path) -> Vec<(OsString, OsString)> {
        Vec::new()
    }
}

#[cfg(target_os = "macos")]
pub type CurrentPlatform = MacOsSettings;
#[cfg(windows)]
pub type CurrentPlatform = WindowsSettings;
#[cfg(all(unix, not(target_os = "macos")))]
pub type CurrentPlatform = UnixSettings;

/// Settings for the platform this binary was built for.
pub fn current() -> CurrentPlatform {
    CurrentPlatform::from_env()
}
