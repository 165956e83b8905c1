use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::PixelAssignedEvent;

/// An async callback invoked for every new pixel assignment.
pub type AssignmentHook =
    Arc<dyn Fn(PixelAssignedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// The sending half of the assignment notification channel.
///
/// Cheap to clone; every fulfillment path holds one. The default notifier has no listener attached and drops
/// events silently, which is what callers that do not care about notifications (the tests, mostly) want.
#[derive(Clone, Default)]
pub struct AssignmentNotifier {
    sender: Option<mpsc::Sender<PixelAssignedEvent>>,
}

impl AssignmentNotifier {
    pub async fn notify(&self, event: PixelAssignedEvent) {
        let Some(sender) = &self.sender else { return };
        if let Err(e) = sender.send(event).await {
            error!("📬️ Failed to deliver assignment event: {e}");
        }
    }
}

/// The receiving half: owns the hook and drains the channel.
pub struct AssignmentListener {
    receiver: mpsc::Receiver<PixelAssignedEvent>,
    hook: AssignmentHook,
}

impl AssignmentListener {
    /// Create a connected notifier/listener pair. `buffer_size` bounds the number of undelivered events before
    /// `notify` applies backpressure.
    pub fn new(buffer_size: usize, hook: AssignmentHook) -> (AssignmentNotifier, Self) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (AssignmentNotifier { sender: Some(sender) }, Self { receiver, hook })
    }

    /// Run the hook for each event in arrival order. Returns once every notifier has been dropped and the
    /// remaining buffered events have been handled.
    pub async fn run(mut self) {
        debug!("📬️ Assignment listener started");
        while let Some(event) = self.receiver.recv().await {
            trace!("📬️ Handling assignment event for cell {}", event.assignment.position);
            (self.hook)(event).await;
        }
        debug!("📬️ Assignment listener shut down");
    }

    /// Detach the listener onto the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
