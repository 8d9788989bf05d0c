use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;
use url::Url;

use extraterm_launcher_common::protocol::{
    is_success_status, CommandPayload, COMMAND_PATH, PING_PATH, PONG,
};

const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Status and raw body of a `POST <base>/command` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: u16,
    pub body: String,
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        is_success_status(self.status)
    }
}

/// Client for the main application's HTTP control API.
#[derive(Debug, Clone)]
pub struct ControlClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ControlClient {
    /// The control API only listens on loopback, so proxy settings from the
    /// environment (`HTTP_PROXY` and friends) are ignored.
    pub fn new(base_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .context("failed to build the control API HTTP client")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `true` when `GET <base>/ping` answers 200 with `pong`.
    pub async fn ping(&self) -> bool {
        match self.try_ping().await {
            Ok(alive) => alive,
            Err(e) => {
                debug!(url = %self.base_url, error = %format!("{e:#}"), "ping failed");
                false
            }
        }
    }

    async fn try_ping(&self) -> Result<bool> {
        let url = endpoint(&self.base_url, PING_PATH)?;
        let response = self.http.get(url).timeout(PING_TIMEOUT).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Ok(false);
        }
        let body = response.text().await?;
        Ok(body == PONG)
    }

    /// Submit one command. Non-2xx statuses are returned, not raised;
    /// only transport failures are errors.
    pub async fn submit(&self, payload: &CommandPayload) -> Result<CommandResponse> {
        let url = endpoint(&self.base_url, COMMAND_PATH)?;
        debug!(%url, command = %payload.command, "submitting command");

        let response = self
            .http
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .with_context(|| format!("failed to send command `{}` to {url}", payload.command))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response to command `{}`", payload.command))?;

        Ok(CommandResponse { status, body })
    }
}

/// `<base>/<path>`, ignoring any trailing slash on the base.
pub fn endpoint(base_url: &Url, path: &str) -> Result<Url> {
    let joined = format!("{}/{}", base_url.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).with_context(|| format!("invalid control API endpoint `{joined}`"))
}
