//! Playback restrictions for rendered lessons.
//!
//! Everything here is deterrence against casual copying: an overlay that
//! swallows the first click, browser hints against picture-in-picture and
//! downloads, and suppression of the context menu, drag start, and a few
//! keyboard shortcuts. None of it is access control. Anyone who can load the
//! page can still fetch the media; the access gate is the only boundary.

use lesson_gate_catalog::Presentation;
use serde::{Deserialize, Serialize};

/// A key press with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    key: String,
    ctrl: bool,
    shift: bool,
}

impl KeyChord {
    /// Creates a chord for a key with no modifiers.
    ///
    /// `key` is the DOM `KeyboardEvent.key` value, e.g. `"u"` or `"F12"`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
        }
    }

    /// Sets whether Control is held.
    #[must_use]
    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    /// Sets whether Shift is held.
    #[must_use]
    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    /// Returns the key value.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Keys suppressed while Control is held: view source, save, print, copy,
/// paste, select all.
const CTRL_KEYS: [&str; 6] = ["u", "s", "p", "c", "v", "a"];

/// Keys suppressed while Control and Shift are held: the dev-tools toggles.
const CTRL_SHIFT_KEYS: [&str; 3] = ["i", "j", "c"];

/// The fixed table of suppressed keyboard shortcuts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutPolicy;

impl ShortcutPolicy {
    /// Returns true if the chord must be swallowed while a guarded view is
    /// mounted.
    #[must_use]
    pub fn suppresses(&self, chord: &KeyChord) -> bool {
        if chord.key == "F12" {
            return true;
        }
        if !chord.ctrl {
            return false;
        }
        let key = chord.key.to_lowercase();
        CTRL_KEYS.contains(&key.as_str())
            || (chord.shift && CTRL_SHIFT_KEYS.contains(&key.as_str()))
    }
}

/// A rendered player the guard can restrict.
pub trait PlayerHandle {
    /// Returns how the player is rendered.
    fn presentation(&self) -> Presentation;

    /// Asks the player not to offer picture-in-picture.
    fn disable_picture_in_picture(&mut self);

    /// Asks the player not to offer a download control.
    fn disable_download(&mut self);

    /// Shows or hides the click-intercepting overlay. While it is shown the
    /// player receives no pointer events.
    fn set_overlay(&mut self, shown: bool);
}

/// The document a guarded view is mounted in.
pub trait DocumentHandle {
    /// Starts swallowing context-menu, drag-start, and the policy's shortcuts.
    fn suppress_interactions(&mut self, policy: ShortcutPolicy);

    /// Stops swallowing them.
    fn release_interactions(&mut self);
}

/// Applies playback restrictions to rendered lessons.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackGuard {
    policy: ShortcutPolicy,
}

impl PlaybackGuard {
    /// Creates a guard with the standard shortcut table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shortcut policy.
    #[must_use]
    pub fn policy(&self) -> ShortcutPolicy {
        self.policy
    }

    /// Restricts a player that was just put on the page.
    ///
    /// Only native players understand the picture-in-picture and download
    /// hints; provider frames get the overlay alone. External links and
    /// notices are left untouched.
    pub fn protect(&self, player: &mut dyn PlayerHandle) {
        match player.presentation() {
            Presentation::NativePlayer => {
                player.disable_picture_in_picture();
                player.disable_download();
                player.set_overlay(true);
            }
            Presentation::Frame => player.set_overlay(true),
            Presentation::ExternalLink | Presentation::Notice => {}
        }
    }

    /// Handles the one-time play gesture: removes the overlay so the
    /// player's own controls work normally from then on.
    pub fn dismiss(&self, player: &mut dyn PlayerHandle) {
        player.set_overlay(false);
    }

    /// Installs document-level suppression for a mounted guarded view.
    pub fn mount(&self, document: &mut dyn DocumentHandle) {
        document.suppress_interactions(self.policy);
    }

    /// Removes document-level suppression.
    pub fn unmount(&self, document: &mut dyn DocumentHandle) {
        document.release_interactions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakePlayer {
        presentation: Presentation,
        no_pip: bool,
        no_download: bool,
        overlay: bool,
    }

    impl FakePlayer {
        fn new(presentation: Presentation) -> Self {
            Self {
                presentation,
                no_pip: false,
                no_download: false,
                overlay: false,
            }
        }
    }

    impl PlayerHandle for FakePlayer {
        fn presentation(&self) -> Presentation {
            self.presentation
        }

        fn disable_picture_in_picture(&mut self) {
            self.no_pip = true;
        }

        fn disable_download(&mut self) {
            self.no_download = true;
        }

        fn set_overlay(&mut self, shown: bool) {
            self.overlay = shown;
        }
    }

    #[derive(Default)]
    struct FakeDocument {
        suppressing: Option<ShortcutPolicy>,
    }

    impl DocumentHandle for FakeDocument {
        fn suppress_interactions(&mut self, policy: ShortcutPolicy) {
            self.suppressing = Some(policy);
        }

        fn release_interactions(&mut self) {
            self.suppressing = None;
        }
    }

    fn ctrl(key: &str) -> KeyChord {
        KeyChord::new(key).with_ctrl(true)
    }

    #[test]
    fn suppresses_fixed_shortcut_table() {
        let policy = ShortcutPolicy;
        assert!(policy.suppresses(&KeyChord::new("F12")));
        for key in ["u", "S", "p", "c", "v", "A"] {
            assert!(policy.suppresses(&ctrl(key)), "ctrl+{key}");
        }
        for key in ["I", "j", "C"] {
            assert!(policy.suppresses(&ctrl(key).with_shift(true)), "ctrl+shift+{key}");
        }
    }

    #[test]
    fn leaves_other_keys_alone() {
        let policy = ShortcutPolicy;
        assert!(!policy.suppresses(&KeyChord::new("u")));
        assert!(!policy.suppresses(&KeyChord::new(" ")));
        assert!(!policy.suppresses(&KeyChord::new("ArrowRight")));
        assert!(!policy.suppresses(&ctrl("i")));
        assert!(!policy.suppresses(&ctrl("f")));
        assert!(!policy.suppresses(&KeyChord::new("I").with_shift(true)));
    }

    #[test]
    fn native_player_gets_all_restrictions() {
        let mut player = FakePlayer::new(Presentation::NativePlayer);
        PlaybackGuard::new().protect(&mut player);
        assert!(player.no_pip);
        assert!(player.no_download);
        assert!(player.overlay);
    }

    #[test]
    fn frame_gets_overlay_only() {
        let mut player = FakePlayer::new(Presentation::Frame);
        PlaybackGuard::new().protect(&mut player);
        assert!(player.overlay);
        assert!(!player.no_pip);
        assert!(!player.no_download);
    }

    #[test]
    fn external_link_is_untouched() {
        let mut player = FakePlayer::new(Presentation::ExternalLink);
        PlaybackGuard::new().protect(&mut player);
        assert!(!player.overlay);
    }

    #[test]
    fn dismiss_restores_controls() {
        let guard = PlaybackGuard::new();
        let mut player = FakePlayer::new(Presentation::NativePlayer);
        guard.protect(&mut player);
        guard.dismiss(&mut player);
        assert!(!player.overlay);
        assert!(player.no_download);
    }

    #[test]
    fn mount_and_unmount_toggle_document_suppression() {
        let guard = PlaybackGuard::new();
        let mut document = FakeDocument::default();
        guard.mount(&mut document);
        assert_eq!(document.suppressing, Some(ShortcutPolicy));
        guard.unmount(&mut document);
        assert_eq!(document.suppressing, None);
    }
}
