//! Controller state exposed read-only to the display surface.

use super::Target;

/// Lifecycle stage for the active target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Everything the display surface needs to render the embed area.
///
/// `target` is present exactly when `phase` is not [`Phase::Idle`].
#[derive(Debug, Clone, Default)]
pub struct EmbedState {
    pub(super) raw_input: String,
    pub(super) target: Option<Target>,
    pub(super) phase: Phase,
}

impl EmbedState {
    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Back to idle with no target.
    pub(super) fn clear_target(&mut self) {
        self.target = None;
        self.phase = Phase::Idle;
    }

    /// Whether `generation` names the current target and it is still loading.
    pub(super) fn is_loading(&self, generation: super::Generation) -> bool {
        self.phase == Phase::Loading
            && self
                .target
                .as_ref()
                .is_some_and(|t| t.generation == generation)
    }
}
