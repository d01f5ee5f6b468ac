//! Executor used when no elevation mechanism is present

use super::traits::{AuthorizationOutcome, ExecOutput, PrivilegedExecutor};
use async_trait::async_trait;

/// Executor for platforms without an elevation mechanism
///
/// Reports itself unavailable, denies every authorization request and
/// refuses to run anything, so installs fail cleanly with
/// [`crate::Error::CapabilityUnavailable`].
///
/// # Examples
///
/// ```
/// use bit_installer::privileged::{PrivilegedExecutor, UnavailableExecutor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let executor = UnavailableExecutor;
/// assert!(!executor.is_available());
/// assert!(executor.run(&["cp".to_string()]).await.is_err());
/// # }
/// ```
pub struct UnavailableExecutor;

#[async_trait]
impl PrivilegedExecutor for UnavailableExecutor {
    fn is_available(&self) -> bool {
        false
    }

    fn has_authorization(&self) -> bool {
        false
    }

    async fn request_authorization(
        &self,
        _request_token: u32,
    ) -> crate::Result<AuthorizationOutcome> {
        Ok(AuthorizationOutcome::Denied)
    }

    async fn run(&self, _argv: &[String]) -> crate::Result<ExecOutput> {
        Err(crate::Error::CapabilityUnavailable(
            "no privileged execution mechanism configured".into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
