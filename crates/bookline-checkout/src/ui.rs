//! Message channel to the UI's single-threaded context.
//!
//! The checkout never touches UI state directly. It posts [`UiEvent`]s to an
//! unbounded channel that the UI drains on its own thread, so sending never
//! blocks and never runs UI code on the checkout task.

use tokio::sync::mpsc;

use crate::draft::BookingConfirmation;
use crate::presentation::UserFacingError;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ProcessingStarted,
    ProcessingFinished,
    /// Exactly one per failed transaction. Never sent for superseded requests.
    ShowError(UserFacingError),
    /// Non-fatal information (e.g. a refund went through).
    ShowNotice(String),
    /// Sent only after a confirmed payment.
    NavigateToConfirmation(BookingConfirmation),
}

/// Sending half of the UI channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<UiEvent>,
}

/// Create a dispatcher and the receiver the UI drains.
#[must_use]
pub fn ui_channel() -> (UiDispatcher, mpsc::UnboundedReceiver<UiEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiDispatcher { tx }, rx)
}

impl UiDispatcher {
    pub fn send(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("ui receiver dropped; event discarded");
        }
    }

    /// Posts [`UiEvent::ProcessingStarted`] and returns a guard that posts
    /// [`UiEvent::ProcessingFinished`] exactly once when dropped, however the
    /// transaction ends (including when its future is dropped mid-flight).
    #[must_use = "processing ends as soon as the guard is dropped"]
    pub fn begin_processing(&self) -> ProcessingGuard {
        self.send(UiEvent::ProcessingStarted);
        ProcessingGuard { ui: self.clone() }
    }
}

pub struct ProcessingGuard {
    ui: UiDispatcher,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.ui.send(UiEvent::ProcessingFinished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_brackets_processing() {
        let (ui, mut rx) = ui_channel();
        {
            let _guard = ui.begin_processing();
            ui.send(UiEvent::ShowNotice("working".into()));
        }
        assert_eq!(rx.try_recv().unwrap(), UiEvent::ProcessingStarted);
        assert_eq!(rx.try_recv().unwrap(), UiEvent::ShowNotice("working".into()));
        assert_eq!(rx.try_recv().unwrap(), UiEvent::ProcessingFinished);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn guard_fires_when_future_is_dropped() {
        let (ui, mut rx) = ui_channel();
        let task = tokio::spawn({
            let ui = ui.clone();
            async move {
                let _guard = ui.begin_processing();
                std::future::pending::<()>().await;
            }
        });
        assert_eq!(rx.recv().await, Some(UiEvent::ProcessingStarted));
        task.abort();
        let _ = task.await;
        assert_eq!(rx.recv().await, Some(UiEvent::ProcessingFinished));
    }

    #[test]
    fn sending_without_receiver_is_harmless() {
        let (ui, rx) = ui_channel();
        drop(rx);
        ui.send(UiEvent::ProcessingStarted);
    }
}
