//! Acquisition orchestrator
//!
//! Drives one attempt through `Connecting → Downloading → Verifying →
//! Installing → Success`, ending in `Failed` on the first error. Every state
//! is published on a broadcast channel in the order it is entered.

mod state_machine;
mod temp_artifact;


use crate::config::Config;
use crate::download::Downloader;
use crate::error::{Error, Result};
use crate::hashing::digests_match;
use crate::installer::PrivilegedInstaller;
use crate::privileged::PrivilegedExecutor;
use crate::types::{AcquisitionRequest, AcquisitionState, FailureReason};
use crate::utils::{check_free_space, temp_artifact_path};
use crate::validation::{PackageId, RelativeDestinationPath};
use state_machine::StateMachine;
use std::path::Path;
use std::sync::Arc;
use temp_artifact::TempArtifact;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Downloads, verifies and installs one artifact per attempt
///
/// Attempts never overlap: [`run`](Self::run) borrows the orchestrator
/// mutably. Each attempt gets a fresh state machine and a fresh temp file,
/// and the temp file is deleted before the terminal state is published.
///
/// ```no_run
/// use bit_installer::{AcquisitionOrchestrator, AcquisitionRequest, CommandExecutor, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> bit_installer::Result<()> {
/// let mut orchestrator =
///     AcquisitionOrchestrator::new(Config::default(), Arc::new(CommandExecutor::direct()))?;
///
/// let mut states = orchestrator.subscribe();
/// tokio::spawn(async move {
///     while let Ok(state) = states.recv().await {
///         println!("{state:?}");
///     }
/// });
///
/// let outcome = orchestrator
///     .run(AcquisitionRequest {
///         url: "https://example.com/patch.bin".to_string(),
///         package_id: "com.example.game".to_string(),
///         relative_path: "files/patch.bin".to_string(),
///         expected_digest: None,
///     })
///     .await;
/// println!("finished: {outcome:?}");
/// # Ok(())
/// # }
/// ```
pub struct AcquisitionOrchestrator {
    config: Config,
    downloader: Downloader,
    installer: PrivilegedInstaller,
    event_tx: broadcast::Sender<AcquisitionState>,
    state: AcquisitionState,
}

impl AcquisitionOrchestrator {
    /// Create an orchestrator using `executor` for the privileged copy
    pub fn new(config: Config, executor: Arc<dyn PrivilegedExecutor>) -> Result<Self> {
        let downloader = Downloader::new(&config.download)?;
        let installer = PrivilegedInstaller::new(&config.install, executor);
        let (event_tx, _rx) = broadcast::channel(1000);

        Ok(Self {
            config,
            downloader,
            installer,
            event_tx,
            state: AcquisitionState::Idle,
        })
    }

    /// Subscribe to state transitions
    ///
    /// Receivers only see states published after they subscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<AcquisitionState> {
        self.event_tx.subscribe()
    }

    /// State reached by the most recent attempt (`Idle` before the first)
    pub fn state(&self) -> &AcquisitionState {
        &self.state
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one attempt to completion and return its terminal state
    pub async fn run(&mut self, request: AcquisitionRequest) -> AcquisitionState {
        self.run_cancellable(request, CancellationToken::new()).await
    }

    /// Run one attempt, ending in `Failed(Cancelled)` if `cancel` fires first
    ///
    /// The temp file is removed on every exit path. If the returned future
    /// is dropped mid-attempt, the file is removed synchronously.
    pub async fn run_cancellable(
        &mut self,
        request: AcquisitionRequest,
        cancel: CancellationToken,
    ) -> AcquisitionState {
        let mut machine = StateMachine::new(self.event_tx.clone());
        let artifact = TempArtifact::new(temp_artifact_path(&self.config.download.temp_dir));
        info!(url = %request.url, package_id = %request.package_id, "starting acquisition");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.attempt(&request, artifact.path(), &mut machine) => result,
        };

        if let Err(e) = artifact.remove().await {
            warn!(error = %e, "failed to remove temp artifact");
        }

        let terminal = match outcome {
            Ok(()) => {
                info!(package_id = %request.package_id, "acquisition succeeded");
                AcquisitionState::Success
            }
            Err(e) => {
                error!(package_id = %request.package_id, error = %e, "acquisition failed");
                AcquisitionState::Failed {
                    reason: FailureReason::from(&e),
                }
            }
        };
        machine.transition(terminal);
        self.state = machine.current().clone();
        self.state.clone()
    }

    async fn attempt(
        &self,
        request: &AcquisitionRequest,
        artifact: &Path,
        machine: &mut StateMachine,
    ) -> Result<()> {
        PackageId::parse(&request.package_id)?;
        RelativeDestinationPath::parse(&request.relative_path)?;

        let download = &self.config.download;
        let available = check_free_space(&download.temp_dir, download.min_free_space)?;
        debug!(available, required = download.min_free_space, "free space check passed");
        tokio::fs::create_dir_all(&download.temp_dir).await?;

        machine.transition(AcquisitionState::Connecting);
        machine.progress(0);
        let digest = self
            .downloader
            .download(&request.url, artifact, |progress| machine.progress(progress))
            .await?;

        machine.transition(AcquisitionState::Verifying {
            digest: digest.clone(),
        });
        match &request.expected_digest {
            Some(expected) if !digests_match(expected, &digest) => {
                warn!(expected = %expected, actual = %digest, "digest mismatch");
                return Err(Error::IntegrityMismatch {
                    expected: expected.trim().to_ascii_lowercase(),
                    actual: digest,
                });
            }
            Some(_) => debug!("digest verified"),
            None => debug!(digest = %digest, "no expected digest configured"),
        }

        machine.transition(AcquisitionState::Installing);
        let destination = self
            .installer
            .install(artifact, &request.package_id, &request.relative_path)
            .await?;
        debug!(destination = %destination, "artifact placed");
        Ok(())
    }
}
