//! Forward-only state tracking for a single attempt

use crate::types::AcquisitionState;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Publishes the states of one attempt, refusing any backward move
///
/// Progress updates must strictly increase; repeats and regressions are
/// dropped. Every other transition must move to a later state.
pub(crate) struct StateMachine {
    current: AcquisitionState,
    event_tx: broadcast::Sender<AcquisitionState>,
}

impl StateMachine {
    pub(crate) fn new(event_tx: broadcast::Sender<AcquisitionState>) -> Self {
        Self {
            current: AcquisitionState::Idle,
            event_tx,
        }
    }

    pub(crate) fn current(&self) -> &AcquisitionState {
        &self.current
    }

    /// Move to `next`; returns whether the state was published
    pub(crate) fn transition(&mut self, next: AcquisitionState) -> bool {
        if self.current.is_terminal() {
            warn!(current = ?self.current, ?next, "transition after terminal state ignored");
            return false;
        }

        match (&self.current, &next) {
            (
                AcquisitionState::Downloading { progress: previous },
                AcquisitionState::Downloading { progress },
            ) => {
                if progress <= previous {
                    return false;
                }
            }
            _ if next.rank() <= self.current.rank() => {
                warn!(current = ?self.current, ?next, "backward transition ignored");
                return false;
            }
            _ => {}
        }

        debug!(state = ?next, "state transition");
        // No subscribers is fine
        self.event_tx.send(next.clone()).ok();
        self.current = next;
        true
    }

    pub(crate) fn progress(&mut self, progress: u8) {
        self.transition(AcquisitionState::Downloading { progress });
    }
}
