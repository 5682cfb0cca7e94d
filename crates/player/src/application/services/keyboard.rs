//! Keyboard shortcuts for the control surface.

use crate::application::services::playback_controls::{
    PlaybackControls, SEEK_STEP_SECS, VOLUME_STEP,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortcut {
    TogglePlay,
    ToggleFullscreen,
    ToggleMute,
    SeekBy(f64),
    AdjustVolume(f64),
    /// Jump to `n / 10` of the duration
    SeekToDecile(u8),
}

impl Shortcut {
    /// Map a host key name (`KeyboardEvent.key` naming) to a shortcut.
    pub fn from_key(key: &str) -> Option<Self> {
        let shortcut = match key {
            " " | "Space" | "Spacebar" | "k" | "K" => Self::TogglePlay,
            "f" | "F" => Self::ToggleFullscreen,
            "m" | "M" => Self::ToggleMute,
            "ArrowLeft" => Self::SeekBy(-SEEK_STEP_SECS),
            "ArrowRight" => Self::SeekBy(SEEK_STEP_SECS),
            "ArrowUp" => Self::AdjustVolume(VOLUME_STEP),
            "ArrowDown" => Self::AdjustVolume(-VOLUME_STEP),
            _ => {
                let mut chars = key.chars();
                let digit = chars.next()?.to_digit(10)?;
                if chars.next().is_some() {
                    return None;
                }
                Self::SeekToDecile(digit as u8)
            }
        };
        Some(shortcut)
    }
}

/// Where keyboard focus was when the key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Body,
    TextInput,
    TextArea,
    ContentEditable,
    Other,
}

impl FocusTarget {
    pub fn is_text_entry(self) -> bool {
        matches!(
            self,
            Self::TextInput | Self::TextArea | Self::ContentEditable
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key was consumed; the host should suppress its default action
    Handled,
    Ignored,
}

#[derive(Clone)]
pub struct KeyboardDispatcher {
    controls: PlaybackControls,
}

impl KeyboardDispatcher {
    pub fn new(controls: PlaybackControls) -> Self {
        Self { controls }
    }

    pub async fn handle_key(&self, key: &str, focus: FocusTarget) -> KeyOutcome {
        if focus.is_text_entry() {
            return KeyOutcome::Ignored;
        }
        let Some(shortcut) = Shortcut::from_key(key) else {
            return KeyOutcome::Ignored;
        };

        tracing::trace!(key, ?shortcut, "Keyboard shortcut");
        match shortcut {
            Shortcut::TogglePlay => self.controls.toggle_play_pause().await,
            Shortcut::ToggleFullscreen => self.controls.toggle_fullscreen(),
            Shortcut::ToggleMute => self.controls.toggle_mute(),
            Shortcut::SeekBy(delta) => self.controls.seek_by(delta),
            Shortcut::AdjustVolume(delta) => self.controls.adjust_volume(delta),
            Shortcut::SeekToDecile(n) => self.controls.seek_to_fraction(f64::from(n) / 10.0),
        }
        KeyOutcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::playback_projector::PlaybackStateProjector;
    use crate::application::services::session_lifecycle::SessionLifecycleController;
    use crate::infrastructure::testing::{
        test_context, EngineLog, FakeEngineFactory, FakeMediaSurface, RecordingNotifier,
    };
    use crate::ports::outbound::{MediaSurfacePort, MockFullscreenPort};
    use std::sync::Arc;

    fn dispatcher() -> (KeyboardDispatcher, Arc<FakeMediaSurface>) {
        let surface = Arc::new(FakeMediaSurface::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = test_context(
            Arc::new(FakeEngineFactory::new(EngineLog::default())),
            surface.clone(),
            notifier.clone(),
        );
        let controls = PlaybackControls::new(
            surface.clone(),
            Arc::new(MockFullscreenPort::new()),
            SessionLifecycleController::new(&ctx),
            Arc::new(PlaybackStateProjector::new(surface.clone(), notifier)),
        );
        (KeyboardDispatcher::new(controls), surface)
    }

    #[test]
    fn maps_fixed_bindings() {
        assert_eq!(Shortcut::from_key(" "), Some(Shortcut::TogglePlay));
        assert_eq!(Shortcut::from_key("k"), Some(Shortcut::TogglePlay));
        assert_eq!(Shortcut::from_key("f"), Some(Shortcut::ToggleFullscreen));
        assert_eq!(Shortcut::from_key("m"), Some(Shortcut::ToggleMute));
        assert_eq!(Shortcut::from_key("ArrowLeft"), Some(Shortcut::SeekBy(-10.0)));
        assert_eq!(Shortcut::from_key("ArrowUp"), Some(Shortcut::AdjustVolume(0.1)));
        assert_eq!(Shortcut::from_key("0"), Some(Shortcut::SeekToDecile(0)));
        assert_eq!(Shortcut::from_key("7"), Some(Shortcut::SeekToDecile(7)));
        assert_eq!(Shortcut::from_key("12"), None);
        assert_eq!(Shortcut::from_key("Enter"), None);
        assert_eq!(Shortcut::from_key(""), None);
    }

    #[tokio::test]
    async fn digit_seeks_to_decile() {
        let (dispatcher, surface) = dispatcher();
        surface.set_timeline(0.0, 300.0, vec![]);

        let outcome = dispatcher.handle_key("3", FocusTarget::Body).await;

        assert_eq!(outcome, KeyOutcome::Handled);
        assert!((surface.current_time() - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn arrows_step_volume_within_bounds() {
        let (dispatcher, surface) = dispatcher();
        surface.set_volume(0.05);

        dispatcher.handle_key("ArrowDown", FocusTarget::Body).await;
        assert_eq!(surface.volume(), 0.0);
        assert!(surface.is_muted());

        dispatcher.handle_key("ArrowUp", FocusTarget::Body).await;
        assert_eq!(surface.volume(), 0.1);
        assert!(!surface.is_muted());
    }

    #[tokio::test]
    async fn text_entry_focus_suppresses_shortcuts() {
        let (dispatcher, surface) = dispatcher();
        surface.set_timeline(0.0, 300.0, vec![]);

        for focus in [
            FocusTarget::TextInput,
            FocusTarget::TextArea,
            FocusTarget::ContentEditable,
        ] {
            assert_eq!(dispatcher.handle_key("5", focus).await, KeyOutcome::Ignored);
        }
        assert_eq!(surface.current_time(), 0.0);
    }

    #[tokio::test]
    async fn space_toggles_playback() {
        let (dispatcher, surface) = dispatcher();

        dispatcher.handle_key(" ", FocusTarget::Other).await;

        assert!(!surface.is_paused());
    }
}
