//! Local HTTP server standing in for the provider and Sonar APIs.
//!
//! Tests install a handler that routes on the request path and inspect the
//! recorded request URIs afterwards.

use assert_cmd::prelude::*;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::{Request, Response, StatusCode, body::Incoming, service::service_fn};
use hyper_util::rt::TokioIo;
use std::io::ErrorKind;
use std::{
    net::SocketAddr,
    path::Path,
    process::Command,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Shared handler type invoked for each incoming request.
pub type Handler = Arc<Mutex<Box<dyn FnMut(&Request<Incoming>) -> Response<Full<Bytes>> + Send>>>;

/// Every request target (path and query) the server has seen, in order.
pub type RequestLog = Arc<Mutex<Vec<String>>>;

/// Handle returned by [`start_mock`] for shutting down the server.
pub struct ShutdownHandle {
    join: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl ShutdownHandle {
    /// Signal the server to stop and await shutdown.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.join.await;
    }
}

/// Build a response with the given status, content type and body.
///
/// # Panics
///
/// Panics if the response cannot be constructed.
#[allow(dead_code, reason = "helper used in some tests only")]
pub fn respond(status: u16, content_type: &str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::from_u16(status).expect("status code"))
        .header("Content-Type", content_type)
        .body(Full::new(body.into()))
        .expect("build response")
}

/// JSON response with status 200.
#[allow(dead_code, reason = "helper used in some tests only")]
pub fn json_ok(value: &serde_json::Value) -> Response<Full<Bytes>> {
    respond(200, "application/json", value.to_string())
}

/// Start an HTTP/1 server forwarding requests to a shared handler.
///
/// # Errors
///
/// Returns an error if the server fails to bind to a local port.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! uses % internally"
)]
pub async fn start_mock() -> Result<(SocketAddr, Handler, RequestLog, ShutdownHandle), std::io::Error>
{
    let handler: Handler = Arc::new(Mutex::new(Box::new(|_req| {
        respond(404, "text/plain", "No handler")
    })));
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let handler_clone = handler.clone();
    let log_clone = log.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, mut rx) = oneshot::channel();

    let join = tokio::spawn(async move {
        loop {
            tokio::select! {
                res = listener.accept() => match res {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let h = handler_clone.clone();
                        let log = log_clone.clone();
                        let service = service_fn(move |req: Request<Incoming>| {
                            log.lock().expect("lock request log").push(req.uri().to_string());
                            let mut f = h.lock().expect("lock handler in service");
                            let resp = (f)(&req);
                            async move { Ok::<_, std::convert::Infallible>(resp) }
                        });
                        tokio::spawn(async move {
                            let _ = http1::Builder::new().serve_connection(io, service).await;
                        });
                    }
                    Err(e) => {
                        eprintln!("accept error: {e}");
                        match e.kind() {
                            ErrorKind::ConnectionAborted
                            | ErrorKind::ConnectionReset
                            | ErrorKind::Interrupted
                            | ErrorKind::WouldBlock => {}
                            _ => break,
                        }
                    }
                },
                _ = &mut rx => break,
            }
        }
    });

    Ok((addr, handler, log, ShutdownHandle { join, stop: tx }))
}

/// Replace the server's handler.
///
/// # Panics
///
/// Panics if the handler lock is poisoned.
#[allow(dead_code, reason = "helper used in some tests only")]
pub fn set_handler<F>(handler: &Handler, f: F)
where
    F: FnMut(&Request<Incoming>) -> Response<Full<Bytes>> + Send + 'static,
{
    *handler.lock().expect("lock handler") = Box::new(f);
}

/// Value of query parameter `name` in a logged request target.
#[allow(dead_code, reason = "helper used in some tests only")]
#[must_use]
pub fn query_param(target: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(&format!("http://localhost{target}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Snapshot of the request log.
///
/// # Panics
///
/// Panics if the log lock is poisoned.
#[allow(dead_code, reason = "helper used in some tests only")]
#[must_use]
pub fn requests(log: &RequestLog) -> Vec<String> {
    log.lock().expect("lock request log").clone()
}

/// Create an `sqi` command isolated from the caller's configuration.
///
/// Runs in `dir`, with XDG and home directories pointing there and every
/// credential variable removed.
#[allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    reason = "helper for integration tests"
)]
pub fn sqi_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sqi").expect("binary");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("RUST_LOG", "sqi=warn");
    for key in [
        "GITHUB_TOKEN",
        "BITBUCKET_TOKEN",
        "BITBUCKET_EMAIL",
        "SONAR_TOKEN",
        "SQI_CONFIG_PATH",
        "SQI_GITHUB_TOKEN",
        "SQI_BITBUCKET_TOKEN",
        "SQI_BITBUCKET_EMAIL",
        "SQI_SONAR_TOKEN",
        "SQI_SONAR_URL",
        "SQI_SONAR_PROJECT_KEY",
        "SQI_PROVIDER",
        "SQI_REPO",
    ] {
        cmd.env_remove(key);
    }
    cmd
}
