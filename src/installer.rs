//! Privileged placement of a verified file into a package's data directory

use crate::config::InstallConfig;
use crate::error::{Error, Result};
use crate::privileged::{AuthorizationOutcome, PrivilegedExecutor};
use crate::validation::{CanonicalDestination, PackageId, PathValidator, RelativeDestinationPath};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Copies verified files into protected destinations through a [`PrivilegedExecutor`]
///
/// Every destination is resolved with [`PathValidator`] before the executor
/// is touched. The copy is issued as the argument vector
/// `[copy_binary, source, canonical_destination]`.
pub struct PrivilegedInstaller {
    validator: PathValidator,
    executor: Arc<dyn PrivilegedExecutor>,
    copy_binary: String,
    authorization_token: u32,
}

impl PrivilegedInstaller {
    /// Create an installer from configuration and an executor
    pub fn new(config: &InstallConfig, executor: Arc<dyn PrivilegedExecutor>) -> Self {
        Self {
            validator: PathValidator::new(config.privileged_root.clone()),
            executor,
            copy_binary: config.copy_binary.clone(),
            authorization_token: config.authorization_token,
        }
    }

    /// The validator used to resolve destinations
    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    /// Argument vector for copying `source` to `destination`
    pub fn copy_command(&self, source: &Path, destination: &CanonicalDestination) -> Result<Vec<String>> {
        let source = source.to_str().ok_or_else(|| {
            Error::validation("source_file", "path is not valid UTF-8")
        })?;
        let destination = destination.as_path().to_str().ok_or_else(|| {
            Error::validation("destination", "path is not valid UTF-8")
        })?;
        Ok(vec![
            self.copy_binary.clone(),
            source.to_string(),
            destination.to_string(),
        ])
    }

    /// Make sure the executor is reachable and authorized, asking the user if needed
    ///
    /// A denial is final; it is not retried.
    pub async fn ensure_authorized(&self) -> Result<()> {
        if !self.executor.is_available() {
            return Err(Error::CapabilityUnavailable(format!(
                "{} executor is not available",
                self.executor.name()
            )));
        }
        if self.executor.has_authorization() {
            return Ok(());
        }

        info!(
            executor = self.executor.name(),
            token = self.authorization_token,
            "awaiting privileged authorization"
        );
        match self
            .executor
            .request_authorization(self.authorization_token)
            .await?
        {
            AuthorizationOutcome::Granted if self.executor.has_authorization() => Ok(()),
            AuthorizationOutcome::Granted => Err(Error::Unexpected(
                "authorization reported granted but executor is still unauthorized".into(),
            )),
            AuthorizationOutcome::Denied => {
                warn!(executor = self.executor.name(), "privileged authorization denied");
                Err(Error::AuthorizationDenied)
            }
        }
    }

    /// Copy `source_file` to `<root>/<package_id>/<relative_path>`
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the identifiers are malformed or the
    ///   destination escapes the package root; the executor is not invoked
    /// - [`Error::CapabilityUnavailable`] / [`Error::AuthorizationDenied`]
    ///   if elevated access cannot be obtained
    /// - [`Error::PrivilegedExecution`] if the copy exits non-zero
    /// - [`Error::PrivilegedInvocation`] if the copy cannot be started
    pub async fn install(
        &self,
        source_file: &Path,
        package_id: &str,
        relative_path: &str,
    ) -> Result<CanonicalDestination> {
        let package = PackageId::parse(package_id)?;
        let relative = RelativeDestinationPath::parse(relative_path)?;
        let destination = self.validator.resolve(&package, &relative)?;
        let argv = self.copy_command(source_file, &destination)?;

        self.ensure_authorized().await?;

        debug!(package_id, destination = %destination, "running privileged copy");
        let output = self.executor.run(&argv).await?;
        if !output.success() {
            warn!(
                package_id,
                exit_code = ?output.exit_code,
                stderr = %output.stderr,
                "privileged copy failed"
            );
            return Err(Error::PrivilegedExecution {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        info!(package_id, destination = %destination, "installed artifact");
        Ok(destination)
    }
}
