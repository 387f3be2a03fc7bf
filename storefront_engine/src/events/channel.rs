//! Delivery of engine events to their subscribers.
//!
//! `OrderFlowApi` publishes an [`OrderCompletedEvent`](super::OrderCompletedEvent) once a paid order has been
//! committed. The event travels over a bounded mpsc channel to an [`EventHandler`], which runs the subscriber's hook
//! (the confirmation email, say) on its own task. Publishing therefore only waits for channel capacity, never for
//! the hook, and a hook that fails cannot undo the commit that triggered it.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// The receiving end of one subscription. Producers are handed out with [`EventHandler::subscribe`].
pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    hook: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, hook: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, hook }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs the hook for every event received. Returns once all producers are gone and every hook call has finished.
    pub async fn start_handler(self) {
        let Self { mut receiver, sender, hook } = self;
        // Only the producers may keep the channel open
        drop(sender);
        debug!("📬️ Event handler started");
        let mut running = JoinSet::new();
        while let Some(event) = receiver.recv().await {
            running.spawn((hook)(event));
            // Reap whatever has already finished so the set does not grow without bound
            while let Some(done) = running.try_join_next() {
                log_outcome(done);
            }
        }
        if !running.is_empty() {
            debug!("📬️ Waiting for {} hook calls to finish", running.len());
        }
        while let Some(done) = running.join_next().await {
            log_outcome(done);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn log_outcome(result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => trace!("📬️ Event handled"),
        Err(e) => error!("📬️ An event hook did not complete. {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues the event. If the handler has already shut down the event is dropped and logged.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ No handler is listening. Event dropped. {e}");
        }
    }
}
