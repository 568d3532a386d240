use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::trace;

use tourguide_core_types::GuideError;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

/// Publishing is synchronous: tour transitions happen under a lock and must
/// not await.
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    fn publish(&self, event: E) -> Result<usize, GuideError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// In-memory broadcast bus.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Publish and drop the event when nobody is listening.
    pub fn emit(&self, event: E) {
        if let Err(err) = self.publish(event) {
            trace!(target: "bus", "event dropped: {err}");
        }
    }
}

impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    fn publish(&self, event: E) -> Result<usize, GuideError> {
        self.sender
            .send(event)
            .map_err(|_| GuideError::new("no subscribers"))
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Helper to materialise an mpsc receiver from the bus subscription
/// so callers can await events without handling broadcast lag directly.
pub fn to_mpsc<E>(bus: &InMemoryBus<E>, capacity: usize) -> mpsc::Receiver<E>
where
    E: Event,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    if tx.send(ev).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!(target: "bus", skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}
