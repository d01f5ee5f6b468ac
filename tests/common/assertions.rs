//! Assertions over published acquisition states

use bit_installer::AcquisitionState;
use tokio::sync::broadcast;

/// Drain every state already published on `rx`
pub fn drain_states(rx: &mut broadcast::Receiver<AcquisitionState>) -> Vec<AcquisitionState> {
    let mut states = Vec::new();
    while let Ok(state) = rx.try_recv() {
        states.push(state);
    }
    states
}

/// Progress values in publication order
pub fn progress_values(states: &[AcquisitionState]) -> Vec<u8> {
    states
        .iter()
        .filter_map(|state| match state {
            AcquisitionState::Downloading { progress } => Some(*progress),
            _ => None,
        })
        .collect()
}

fn stage(state: &AcquisitionState) -> u8 {
    match state {
        AcquisitionState::Idle => 0,
        AcquisitionState::Connecting => 1,
        AcquisitionState::Downloading { .. } => 2,
        AcquisitionState::Verifying { .. } => 3,
        AcquisitionState::Installing => 4,
        AcquisitionState::Success | AcquisitionState::Failed { .. } => 5,
    }
}

/// Check the ordering guarantees of one attempt's state stream
///
/// Stages never go backwards, progress never decreases, `Verifying` and
/// `Installing` appear at most once and exactly one terminal state comes last.
pub fn assert_well_ordered(states: &[AcquisitionState]) {
    assert!(
        states.windows(2).all(|w| stage(&w[0]) <= stage(&w[1])),
        "stages went backwards: {states:?}"
    );

    let progress = progress_values(states);
    assert!(
        progress.windows(2).all(|w| w[0] <= w[1]),
        "progress decreased: {progress:?}"
    );

    let verifying = states
        .iter()
        .filter(|s| matches!(s, AcquisitionState::Verifying { .. }))
        .count();
    let installing = states
        .iter()
        .filter(|s| matches!(s, AcquisitionState::Installing))
        .count();
    assert!(verifying <= 1, "Verifying published {verifying} times");
    assert!(installing <= 1, "Installing published {installing} times");

    let terminal = states.iter().filter(|s| s.is_terminal()).count();
    assert_eq!(terminal, 1, "expected exactly one terminal state: {states:?}");
    assert!(
        states.last().is_some_and(AcquisitionState::is_terminal),
        "terminal state must come last: {states:?}"
    );
}
