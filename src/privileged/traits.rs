//! Traits and types for the privileged execution capability

use async_trait::async_trait;

/// Answer to an authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// The user granted elevated access
    Granted,
    /// The user (or the platform) refused
    Denied,
}

/// Result of running an argument vector with elevated privilege
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured standard error output
    pub stderr: String,
}

impl ExecOutput {
    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Capability that runs an exact argument vector with elevated privilege
///
/// Implementations never pass the arguments through a shell. The
/// authorization grant is user-mediated and may be denied; callers must not
/// call [`run`](Self::run) before [`has_authorization`](Self::has_authorization)
/// reports true.
///
/// # Examples
///
/// ```no_run
/// use bit_installer::privileged::{AuthorizationOutcome, CommandExecutor, PrivilegedExecutor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = CommandExecutor::sudo_from_path().expect("sudo not found");
///
/// if !executor.has_authorization()
///     && executor.request_authorization(1001).await? == AuthorizationOutcome::Denied
/// {
///     return Ok(());
/// }
///
/// let argv = vec!["cp".to_string(), "/tmp/a".to_string(), "/tmp/b".to_string()];
/// let output = executor.run(&argv).await?;
/// println!("exit code: {:?}", output.exit_code);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait PrivilegedExecutor: Send + Sync {
    /// Whether the elevation mechanism is reachable at all
    fn is_available(&self) -> bool;

    /// Whether elevated access has already been granted
    fn has_authorization(&self) -> bool;

    /// Ask the user for elevated access
    ///
    /// # Errors
    ///
    /// Returns an error only if the request could not be issued; a refusal
    /// is reported as [`AuthorizationOutcome::Denied`].
    async fn request_authorization(&self, request_token: u32)
    -> crate::Result<AuthorizationOutcome>;

    /// Run `argv` with elevated privilege
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PrivilegedInvocation`] if the process could not
    /// be started. A process that starts and exits non-zero is reported
    /// through [`ExecOutput`], not as an error.
    async fn run(&self, argv: &[String]) -> crate::Result<ExecOutput>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
