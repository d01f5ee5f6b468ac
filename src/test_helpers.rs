//! Shared test helpers: a recording privileged executor, filesystem fixtures
//! and a raw HTTP responder.

use crate::error::Error;
use crate::privileged::{AuthorizationOutcome, ExecOutput, PrivilegedExecutor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Create `<root>/<package_id>/files` and return the package root
pub(crate) fn package_root(root: &Path, package_id: &str) -> PathBuf {
    let package = root.join(package_id);
    std::fs::create_dir_all(package.join("files")).unwrap();
    package
}

/// Answer one request on a local socket with the exact bytes of `response`
///
/// With `stall` set the connection is held open afterwards instead of being
/// closed. Returns the URL to request.
pub(crate) async fn serve_raw_http(response: Vec<u8>, stall: bool) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket.write_all(&response).await.unwrap();
        socket.flush().await.unwrap();
        if stall {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    });
    format!("http://{addr}/asset.bin")
}

/// In-process stand-in for an elevation mechanism
///
/// A successful run performs the copy with `std::fs::copy` so tests can
/// check the destination contents.
pub(crate) struct RecordingExecutor {
    available: bool,
    authorized: AtomicBool,
    grant: bool,
    exit_code: i32,
    stderr: String,
    runs: Mutex<Vec<Vec<String>>>,
    auth_requests: AtomicUsize,
}

impl RecordingExecutor {
    fn build(available: bool, authorized: bool, grant: bool) -> Self {
        Self {
            available,
            authorized: AtomicBool::new(authorized),
            grant,
            exit_code: 0,
            stderr: String::new(),
            runs: Mutex::new(Vec::new()),
            auth_requests: AtomicUsize::new(0),
        }
    }

    pub(crate) fn authorized() -> Self {
        Self::build(true, true, true)
    }

    pub(crate) fn granting() -> Self {
        Self::build(true, false, true)
    }

    pub(crate) fn denying() -> Self {
        Self::build(true, false, false)
    }

    pub(crate) fn unavailable() -> Self {
        Self::build(false, false, false)
    }

    pub(crate) fn failing(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code,
            stderr: stderr.to_string(),
            ..Self::authorized()
        }
    }

    pub(crate) fn runs(&self) -> Vec<Vec<String>> {
        self.runs.lock().unwrap().clone()
    }

    pub(crate) fn authorization_requests(&self) -> usize {
        self.auth_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrivilegedExecutor for RecordingExecutor {
    fn is_available(&self) -> bool {
        self.available
    }

    fn has_authorization(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    async fn request_authorization(
        &self,
        _request_token: u32,
    ) -> crate::Result<AuthorizationOutcome> {
        self.auth_requests.fetch_add(1, Ordering::SeqCst);
        if self.grant {
            self.authorized.store(true, Ordering::SeqCst);
            Ok(AuthorizationOutcome::Granted)
        } else {
            Ok(AuthorizationOutcome::Denied)
        }
    }

    async fn run(&self, argv: &[String]) -> crate::Result<ExecOutput> {
        self.runs.lock().unwrap().push(argv.to_vec());
        if self.exit_code == 0 {
            std::fs::copy(&argv[1], &argv[2]).map_err(|e| Error::PrivilegedInvocation(e.to_string()))?;
        }
        Ok(ExecOutput {
            exit_code: Some(self.exit_code),
            stderr: self.stderr.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
