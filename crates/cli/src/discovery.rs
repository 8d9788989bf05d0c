// Discovery file written by the running main application.
//
//   line 1: process id (decimal)
//   line 2: base URL of the control API

use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub pid: u32,
    pub base_url: Url,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("discovery record has no process id line")]
    Empty,

    #[error("invalid process id `{0}`")]
    InvalidPid(String),

    #[error("discovery record has no URL line")]
    MissingUrl,

    #[error("invalid control URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FromStr for DiscoveryRecord {
    type Err = DiscoveryError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut lines = contents.lines().map(str::trim);

        let pid_line = lines.next().filter(|line| !line.is_empty()).ok_or(DiscoveryError::Empty)?;
        let pid =
            pid_line.parse::<u32>().map_err(|_| DiscoveryError::InvalidPid(pid_line.to_string()))?;

        let url_line =
            lines.next().filter(|line| !line.is_empty()).ok_or(DiscoveryError::MissingUrl)?;
        let base_url = Url::parse(url_line).map_err(|e| DiscoveryError::InvalidUrl {
            url: url_line.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { pid, base_url })
    }
}

/// Read the discovery file. A missing or malformed file means no record.
pub fn read_record(path: &Path) -> Option<DiscoveryRecord> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no discovery file");
            return None;
        }
    };
    match contents.parse::<DiscoveryRecord>() {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring discovery file");
            None
        }
    }
}
