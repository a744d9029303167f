use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::player::PlayerState;

/// Visibility state machine for the on-screen transport controls.
///
/// Controls are always visible while not playing. While playing, pointer
/// activity shows them and restarts a single hide timer; the timer is
/// suspended on any transition away from `Playing` and restarted when
/// playback resumes. Every transition has exactly one trigger: an activity
/// event or a backend status change.
pub struct ControlsVisibility {
    visible_tx: watch::Sender<bool>,
    hide_delay: Duration,
    playing: bool,
    hide_timer: Option<JoinHandle<()>>,
}

impl ControlsVisibility {
    pub fn new(hide_delay: Duration) -> Self {
        let (visible_tx, _) = watch::channel(true);
        Self {
            visible_tx,
            hide_delay,
            playing: false,
            hide_timer: None,
        }
    }

    /// Observe visibility changes.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.visible_tx.subscribe()
    }

    pub fn is_visible(&self) -> bool {
        *self.visible_tx.borrow()
    }

    /// Called on pointer movement over the player surface.
    pub fn register_activity(&mut self) {
        self.visible_tx.send_replace(true);
        if self.playing {
            self.restart_hide_timer();
        }
    }

    /// Called on every backend status transition.
    pub fn on_status_changed(&mut self, status: &PlayerState) {
        if status.is_playing() {
            if !self.playing {
                trace!("Playback resumed; arming controls hide timer");
                self.playing = true;
                self.restart_hide_timer();
            }
        } else {
            self.playing = false;
            self.cancel_hide_timer();
            self.visible_tx.send_replace(true);
        }
    }

    /// Cancel the pending timer so no callback fires after teardown.
    pub fn shutdown(&mut self) {
        self.cancel_hide_timer();
    }

    fn restart_hide_timer(&mut self) {
        self.cancel_hide_timer();
        let visible_tx = self.visible_tx.clone();
        let delay = self.hide_delay;
        self.hide_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Timer only exists while playing, so hiding here is safe
            visible_tx.send_replace(false);
        }));
    }

    fn cancel_hide_timer(&mut self) {
        if let Some(timer) = self.hide_timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ControlsVisibility {
    fn drop(&mut self) {
        self.cancel_hide_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const HIDE_DELAY: Duration = Duration::from_millis(40);

    #[tokio::test]
    async fn hides_after_inactivity_while_playing() {
        let mut controls = ControlsVisibility::new(HIDE_DELAY);
        assert!(controls.is_visible());

        controls.on_status_changed(&PlayerState::Playing);
        sleep(HIDE_DELAY * 2).await;
        assert!(!controls.is_visible());
    }

    #[tokio::test]
    async fn activity_resets_the_timer() {
        let mut controls = ControlsVisibility::new(HIDE_DELAY);
        controls.on_status_changed(&PlayerState::Playing);

        // Keep poking before the window elapses
        for _ in 0..3 {
            sleep(HIDE_DELAY / 2).await;
            controls.register_activity();
            assert!(controls.is_visible());
        }

        sleep(HIDE_DELAY * 2).await;
        assert!(!controls.is_visible());
    }

    #[tokio::test]
    async fn pause_forces_visible_and_suspends_timer() {
        let mut controls = ControlsVisibility::new(HIDE_DELAY);
        controls.on_status_changed(&PlayerState::Playing);
        sleep(HIDE_DELAY * 2).await;
        assert!(!controls.is_visible());

        controls.on_status_changed(&PlayerState::Paused);
        assert!(controls.is_visible());

        // No hide while paused, however long we wait
        sleep(HIDE_DELAY * 3).await;
        assert!(controls.is_visible());
    }

    #[tokio::test]
    async fn buffering_keeps_controls_visible() {
        let mut controls = ControlsVisibility::new(HIDE_DELAY);
        controls.on_status_changed(&PlayerState::Playing);
        controls.on_status_changed(&PlayerState::Buffering);
        sleep(HIDE_DELAY * 2).await;
        assert!(controls.is_visible());
    }

    #[tokio::test]
    async fn activity_while_paused_does_not_arm_timer() {
        let mut controls = ControlsVisibility::new(HIDE_DELAY);
        controls.on_status_changed(&PlayerState::Paused);
        controls.register_activity();
        sleep(HIDE_DELAY * 2).await;
        assert!(controls.is_visible());
    }

    #[tokio::test]
    async fn watch_observes_transitions() {
        let mut controls = ControlsVisibility::new(HIDE_DELAY);
        let mut watcher = controls.watch();

        controls.on_status_changed(&PlayerState::Playing);
        sleep(HIDE_DELAY * 2).await;
        watcher.changed().await.unwrap();
        assert!(!*watcher.borrow());
    }
}
