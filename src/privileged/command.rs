//! Process-based privileged executor

use super::traits::{AuthorizationOutcome, ExecOutput, PrivilegedExecutor};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Program that elevates the command placed after it (e.g. `sudo -n`)
#[derive(Debug, Clone)]
pub struct Launcher {
    /// Launcher binary
    pub program: PathBuf,
    /// Arguments placed between the launcher and the command
    pub run_args: Vec<String>,
    /// Arguments that validate credentials without running a command
    pub auth_args: Vec<String>,
}

/// Executor that spawns processes directly, with no shell in between
///
/// Without a launcher the argument vector is executed as-is and the executor
/// is authorized only when the current process already runs as root. With a
/// launcher, authorization is obtained by running the launcher's credential
/// check (for sudo, `sudo -v`, which prompts the user).
pub struct CommandExecutor {
    launcher: Option<Launcher>,
    authorized: AtomicBool,
}

impl CommandExecutor {
    /// Run commands directly with the current process's privileges
    pub fn direct() -> Self {
        Self {
            launcher: None,
            authorized: AtomicBool::new(false),
        }
    }

    /// Run commands behind `launcher`
    pub fn with_launcher(launcher: Launcher) -> Self {
        Self {
            launcher: Some(launcher),
            authorized: AtomicBool::new(false),
        }
    }

    /// Use `sudo` from PATH, non-interactive for commands
    ///
    /// Returns `None` if `sudo` is not installed.
    pub fn sudo_from_path() -> Option<Self> {
        which::which("sudo").ok().map(|program| {
            Self::with_launcher(Launcher {
                program,
                run_args: vec!["-n".to_string(), "--".to_string()],
                auth_args: vec!["-v".to_string()],
            })
        })
    }

    fn build_command(&self, argv: &[String]) -> Option<Command> {
        let (first, rest) = argv.split_first()?;
        let mut command = match &self.launcher {
            Some(launcher) => {
                let mut command = Command::new(&launcher.program);
                command.args(&launcher.run_args).arg(first);
                command
            }
            None => Command::new(first),
        };
        command
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Some(command)
    }
}

#[async_trait]
impl PrivilegedExecutor for CommandExecutor {
    fn is_available(&self) -> bool {
        match &self.launcher {
            Some(launcher) => launcher.program.is_file(),
            None => true,
        }
    }

    fn has_authorization(&self) -> bool {
        self.authorized.load(Ordering::SeqCst) || (self.launcher.is_none() && running_as_root())
    }

    async fn request_authorization(
        &self,
        request_token: u32,
    ) -> crate::Result<AuthorizationOutcome> {
        let Some(launcher) = &self.launcher else {
            let outcome = if running_as_root() {
                AuthorizationOutcome::Granted
            } else {
                AuthorizationOutcome::Denied
            };
            debug!(request_token, ?outcome, "direct executor authorization");
            return Ok(outcome);
        };

        info!(
            request_token,
            launcher = %launcher.program.display(),
            "requesting elevated access"
        );
        let status = Command::new(&launcher.program)
            .args(&launcher.auth_args)
            .status()
            .await
            .map_err(|e| {
                crate::Error::PrivilegedInvocation(format!(
                    "failed to execute {}: {}",
                    launcher.program.display(),
                    e
                ))
            })?;

        if status.success() {
            self.authorized.store(true, Ordering::SeqCst);
            Ok(AuthorizationOutcome::Granted)
        } else {
            warn!(request_token, code = ?status.code(), "elevated access denied");
            Ok(AuthorizationOutcome::Denied)
        }
    }

    async fn run(&self, argv: &[String]) -> crate::Result<ExecOutput> {
        let mut command = self.build_command(argv).ok_or_else(|| {
            crate::Error::PrivilegedInvocation("empty argument vector".to_string())
        })?;

        let output = command.output().await.map_err(|e| {
            crate::Error::PrivilegedInvocation(format!("failed to execute {:?}: {}", argv[0], e))
        })?;

        Ok(ExecOutput {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        match self.launcher {
            Some(_) => "launcher",
            None => "direct",
        }
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}
