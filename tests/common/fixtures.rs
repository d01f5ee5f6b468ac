//! Payload fixtures, a mock artifact server and a fake privileged executor

use async_trait::async_trait;
use bit_installer::{AuthorizationOutcome, Error, ExecOutput, PrivilegedExecutor};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock server serves artifacts under
pub const ARTIFACT_PATH: &str = "/releases/download/v1/patch.bin";

/// Deterministic payload of `len` bytes
pub fn generate_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Serve `body` with `status` at [`ARTIFACT_PATH`]
pub async fn serve_artifact(body: Vec<u8>, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARTIFACT_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .mount(&server)
        .await;
    server
}

/// Download URL of the artifact on `server`
pub fn artifact_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), ARTIFACT_PATH)
}

/// Release listing with one asset pointing at `server`
pub fn releases_json(server: &MockServer, tag: &str, asset: &str) -> String {
    serde_json::json!([{
        "tag_name": tag,
        "body": "app: Example App\nversion: 1.0.0",
        "assets": [{
            "name": asset,
            "browser_download_url": artifact_url(server),
        }],
    }])
    .to_string()
}

/// Fake elevation mechanism that records every argument vector it runs
pub struct FakeExecutor {
    authorized: AtomicBool,
    grant: bool,
    runs: Mutex<Vec<Vec<String>>>,
    auth_requests: AtomicUsize,
}

impl FakeExecutor {
    /// Already authorized
    pub fn authorized() -> Self {
        Self::build(true, true)
    }

    /// Unauthorized; grants when asked
    pub fn granting() -> Self {
        Self::build(false, true)
    }

    /// Unauthorized; denies when asked
    pub fn denying() -> Self {
        Self::build(false, false)
    }

    fn build(authorized: bool, grant: bool) -> Self {
        Self {
            authorized: AtomicBool::new(authorized),
            grant,
            runs: Mutex::new(Vec::new()),
            auth_requests: AtomicUsize::new(0),
        }
    }

    /// Argument vectors passed to `run`
    pub fn runs(&self) -> Vec<Vec<String>> {
        match self.runs.lock() {
            Ok(runs) => runs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of authorization prompts shown
    pub fn authorization_requests(&self) -> usize {
        self.auth_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrivilegedExecutor for FakeExecutor {
    fn is_available(&self) -> bool {
        true
    }

    fn has_authorization(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    async fn request_authorization(
        &self,
        _request_token: u32,
    ) -> bit_installer::Result<AuthorizationOutcome> {
        self.auth_requests.fetch_add(1, Ordering::SeqCst);
        if self.grant {
            self.authorized.store(true, Ordering::SeqCst);
            Ok(AuthorizationOutcome::Granted)
        } else {
            Ok(AuthorizationOutcome::Denied)
        }
    }

    async fn run(&self, argv: &[String]) -> bit_installer::Result<ExecOutput> {
        if let Ok(mut runs) = self.runs.lock() {
            runs.push(argv.to_vec());
        }
        let [_, source, destination] = argv else {
            return Err(Error::PrivilegedInvocation(format!(
                "unexpected argument vector: {argv:?}"
            )));
        };
        tokio::fs::copy(source, destination).await?;
        Ok(ExecOutput {
            exit_code: Some(0),
            stderr: String::new(),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
