use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use url::Url;

use extraterm_launcher::client::ControlClient;
use extraterm_launcher::dispatch::{dispatch, Invocation};
use extraterm_launcher::exit_code::ExitCode;
use extraterm_launcher::launcher::{discover, ensure_running, LaunchError, LaunchPlan};
use extraterm_launcher::settings::LaunchTarget;
use extraterm_launcher_common::args::{parse, Command};
use extraterm_launcher_common::protocol::CommandPayload;

#[derive(Clone, Default)]
struct MockState {
    received: Arc<Mutex<Vec<Value>>>,
}

impl MockState {
    fn received(&self) -> Vec<Value> {
        self.received.lock().expect("mock state lock").clone()
    }
}

struct MockApp {
    url: Url,
    state: MockState,
}

/// Control API double: `/ping` answers `pong`; `/command` records the payload
/// and rejects commands named `fail` with 400.
async fn start_mock_app() -> Option<MockApp> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(error) if error.kind() == io::ErrorKind::PermissionDenied => {
            eprintln!("skipping control API test: bind is not permitted in this environment");
            return None;
        }
        Err(error) => panic!("listener should bind: {error}"),
    };
    let addr: SocketAddr = listener.local_addr().expect("listener should have an address");
    let state = MockState::default();

    let app = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .route("/command", post(handle_command))
        .with_state(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server should run");
    });

    let url = Url::parse(&format!("http://{addr}")).expect("mock url should parse");
    Some(MockApp { url, state })
}

async fn handle_command(
    State(state): State<MockState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.received.lock().expect("mock state lock").push(payload.clone());
    if payload["command"] == "fail" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "Unknown command 'fail'" })));
    }
    (StatusCode::OK, Json(json!({ "ran": payload["command"] })))
}

/// Start a server that answers every ping with something other than `pong`.
async fn start_impostor() -> Option<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    let app = Router::new().route("/ping", get(|| async { "hello" }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}")).ok()
}

/// A URL nothing is listening on.
async fn closed_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");
    drop(listener);
    Url::parse(&format!("http://{addr}")).expect("closed url should parse")
}

fn write_discovery_file(path: &Path, pid: u32, url: &Url) {
    std::fs::write(path, format!("{pid}\n{url}\n")).expect("discovery file should be writable");
}

fn client_for(url: &Url) -> ControlClient {
    ControlClient::new(url.clone()).expect("client should build")
}

fn plan_with_target(discovery_path: PathBuf, target: LaunchTarget) -> LaunchPlan {
    LaunchPlan { discovery_path, target, ready_timeout: Some(Duration::from_secs(10)) }
}

// ── Client ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_recognizes_pong() {
    let Some(app) = start_mock_app().await else { return };
    assert!(client_for(&app.url).ping().await);
}

#[tokio::test]
async fn ping_ignores_proxy_environment() {
    let Some(app) = start_mock_app().await else { return };
    // Nothing listens on the discard port, so a proxied request would fail.
    std::env::set_var("HTTP_PROXY", "http://127.0.0.1:9");
    std::env::set_var("http_proxy", "http://127.0.0.1:9");
    std::env::remove_var("NO_PROXY");
    std::env::remove_var("no_proxy");

    let alive = client_for(&app.url).ping().await;

    std::env::remove_var("HTTP_PROXY");
    std::env::remove_var("http_proxy");
    assert!(alive, "loopback ping must not go through HTTP_PROXY");
}

#[tokio::test]
async fn ping_rejects_other_bodies() {
    let Some(url) = start_impostor().await else { return };
    assert!(!client_for(&url).ping().await);
}

#[tokio::test]
async fn submit_posts_camel_case_payload() {
    let Some(app) = start_mock_app().await else { return };
    let client = client_for(&app.url);

    let mut command = Command::new("extraterm:window.newTerminal")
        .with_parameter("--working-directory", "/home/sbe");
    command.window = Some("3".into());
    let response = client.submit(&CommandPayload::from(&command)).await.expect("submit");

    assert_eq!(response.status, 200);
    assert_eq!(
        app.state.received(),
        vec![json!({
            "command": "extraterm:window.newTerminal",
            "window": "3",
            "args": { "workingDirectory": "/home/sbe" }
        })]
    );
}

#[tokio::test]
async fn submit_to_closed_port_is_a_network_error() {
    let client = client_for(&closed_url().await);
    let err = client
        .submit(&CommandPayload::from(&Command::new("extraterm:window.listAll")))
        .await
        .expect_err("nothing is listening");
    assert_eq!(ExitCode::from_error(&err), ExitCode::Network);
}

// ── Discovery ──────────────────────────────────────────────────────

#[tokio::test]
async fn discover_trusts_live_record() {
    let Some(app) = start_mock_app().await else { return };
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ipc.run");
    write_discovery_file(&path, 4242, &app.url);

    let running = discover(&path).await.unwrap().expect("record should be live");
    assert_eq!(running.client.base_url(), &app.url);
    assert_eq!(running.pid, 4242);
    assert_eq!(running.launched_pid, None);
}

#[tokio::test]
async fn discover_ignores_stale_record() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ipc.run");
    write_discovery_file(&path, 4242, &closed_url().await);

    assert!(discover(&path).await.unwrap().is_none());
}

#[tokio::test]
async fn running_instance_is_reused_without_launching() {
    let Some(app) = start_mock_app().await else { return };
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ipc.run");
    write_discovery_file(&path, 4242, &app.url);

    // Launching this target would fail, so success proves nothing was spawned.
    let plan = plan_with_target(path, LaunchTarget::new(tmp.path().join("no-such-extraterm")));
    let running = ensure_running(&plan).await.expect("existing instance should be used");
    assert_eq!(running.client.base_url(), &app.url);
    assert_eq!(running.launched_pid, None);
}

#[tokio::test]
async fn missing_executable_is_a_launch_failure() {
    let tmp = TempDir::new().unwrap();
    let plan = plan_with_target(
        tmp.path().join("ipc.run"),
        LaunchTarget::new(tmp.path().join("no-such-extraterm")),
    );

    let err = ensure_running(&plan).await.expect_err("launch should fail");
    assert!(matches!(err.downcast_ref::<LaunchError>(), Some(LaunchError::ExecutableNotFound(_))));
    assert_eq!(ExitCode::from_error(&err), ExitCode::LaunchFailed);
}

// ── Launching ──────────────────────────────────────────────────────

/// A stand-in main application: waits a little, then publishes a discovery
/// record carrying its own pid and `url`.
#[cfg(unix)]
fn fake_main_application(discovery_path: &Path, url: &Url) -> LaunchTarget {
    let script = format!(
        "sleep 0.3; printf '%s\\n%s\\n' $$ '{url}' > '{path}.tmp' && mv '{path}.tmp' '{path}'; sleep 2",
        path = discovery_path.display()
    );
    let mut target = LaunchTarget::new("sh");
    target.args = vec!["-c".into(), script.into()];
    target
}

#[cfg(unix)]
#[tokio::test]
async fn launches_and_waits_when_no_record_exists() {
    let Some(app) = start_mock_app().await else { return };
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ipc.run");

    let plan = plan_with_target(path.clone(), fake_main_application(&path, &app.url));
    let running = ensure_running(&plan).await.expect("launched instance should become ready");

    assert_eq!(running.client.base_url(), &app.url);
    // The record was written by the process this call spawned.
    let contents = std::fs::read_to_string(&path).unwrap();
    let recorded: u32 = contents.lines().next().unwrap().parse().unwrap();
    assert_eq!(running.pid, recorded);
    assert_eq!(running.launched_pid, Some(recorded));
}

#[cfg(unix)]
#[tokio::test]
async fn relaunches_when_record_is_stale() {
    let Some(app) = start_mock_app().await else { return };
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ipc.run");
    write_discovery_file(&path, 1, &closed_url().await);

    let plan = plan_with_target(path.clone(), fake_main_application(&path, &app.url));
    let running = ensure_running(&plan).await.expect("relaunched instance should become ready");
    assert_eq!(running.client.base_url(), &app.url);
    assert_eq!(running.launched_pid, Some(running.pid));
}

#[cfg(unix)]
#[tokio::test]
async fn early_exit_is_reported() {
    let tmp = TempDir::new().unwrap();
    let mut target = LaunchTarget::new("sh");
    target.args = vec!["-c".into(), "exit 3".into()];
    let plan = plan_with_target(tmp.path().join("ipc.run"), target);

    let err = ensure_running(&plan).await.expect_err("process exits before becoming ready");
    assert!(matches!(err.downcast_ref::<LaunchError>(), Some(LaunchError::ExitedEarly(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn readiness_wait_times_out() {
    let tmp = TempDir::new().unwrap();
    let mut target = LaunchTarget::new("sh");
    target.args = vec!["-c".into(), "sleep 5".into()];
    let plan = LaunchPlan {
        discovery_path: tmp.path().join("ipc.run"),
        target,
        ready_timeout: Some(Duration::from_millis(600)),
    };

    let err = ensure_running(&plan).await.expect_err("nothing ever becomes ready");
    assert!(matches!(err.downcast_ref::<LaunchError>(), Some(LaunchError::TimedOut(_))));
}

// ── Dispatch ───────────────────────────────────────────────────────

#[tokio::test]
async fn dispatch_stops_at_first_rejected_command() {
    let Some(app) = start_mock_app().await else { return };
    let client = client_for(&app.url);
    let parsed =
        parse(&["extraterm-launcher", "-c", "first", "-c", "fail", "-c", "never"]).unwrap();
    let invocation = Invocation::plan(parsed, std::env::current_dir).unwrap();

    let report = dispatch(&client, &invocation).await.expect("dispatch");

    assert_eq!(report.responses.len(), 2);
    assert_eq!(report.exit_code(), ExitCode::Error);
    let names: Vec<Value> = app.state.received().iter().map(|p| p["command"].clone()).collect();
    assert_eq!(names, vec![json!("first"), json!("fail")]);

    let rendered: Value = serde_json::from_str(&report.render().unwrap()).unwrap();
    assert_eq!(rendered[1]["message"], "Unknown command 'fail'");
}

#[tokio::test]
async fn dispatch_sends_inherited_windows() {
    let Some(app) = start_mock_app().await else { return };
    let client = client_for(&app.url);
    let parsed = parse(&[
        "extraterm-launcher",
        "-w",
        "7",
        "-c",
        "extraterm:window.show",
        "-c",
        "extraterm:window.listAll",
        "--all-tabs",
        "true",
    ])
    .unwrap();
    let invocation = Invocation::plan(parsed, std::env::current_dir).unwrap();

    let report = dispatch(&client, &invocation).await.expect("dispatch");

    assert_eq!(report.exit_code(), ExitCode::Success);
    let received = app.state.received();
    assert_eq!(received[0]["window"], "7");
    assert_eq!(received[1]["window"], "7");
    assert_eq!(received[1]["args"], json!({ "allTabs": "true" }));
}

#[tokio::test]
async fn directory_argument_opens_terminal_then_shows_windows() {
    let Some(app) = start_mock_app().await else { return };
    let client = client_for(&app.url);
    let parsed = parse(&["extraterm-launcher", "/home/sbe"]).unwrap();
    let invocation = Invocation::plan(parsed, std::env::current_dir).unwrap();

    let report = dispatch(&client, &invocation).await.expect("dispatch");

    assert_eq!(report.render(), None);
    assert_eq!(
        app.state.received(),
        vec![
            json!({
                "command": "extraterm:window.newTerminal",
                "args": { "workingDirectory": "/home/sbe" }
            }),
            json!({ "command": "extraterm:window.showAll", "args": {} }),
        ]
    );
}

#[tokio::test]
async fn leading_window_targets_the_implicit_commands() {
    let Some(app) = start_mock_app().await else { return };
    let client = client_for(&app.url);
    let parsed = parse(&["extraterm-launcher", "-w", "3", "/home/sbe"]).unwrap();
    let invocation = Invocation::plan(parsed, std::env::current_dir).unwrap();

    dispatch(&client, &invocation).await.expect("dispatch");

    let windows: Vec<Value> = app.state.received().iter().map(|p| p["window"].clone()).collect();
    assert_eq!(windows, vec![json!("3"), json!("3")]);
}
