//! Single-producer / single-consumer event pipe with a sealed result.
//!
//! The agent loop pushes ordered events into an [`EventSink`] while the
//! one observer drains the matching [`EventStream`]. Sealing the sink
//! resolves the stream's result value; pushes after the seal are
//! discarded. Built on an unbounded channel plus a oneshot for the
//! terminal value.

use tokio::sync::{mpsc, oneshot};

/// Producer half of the pipe.
pub struct EventSink<E, R> {
    events: Option<mpsc::UnboundedSender<E>>,
    done: Option<oneshot::Sender<R>>,
}

/// Consumer half of the pipe.
pub struct EventStream<E, R> {
    events: mpsc::UnboundedReceiver<E>,
    done: oneshot::Receiver<R>,
}

impl<E, R> std::fmt::Debug for EventStream<E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

/// Create a connected sink/stream pair.
#[must_use]
pub fn channel<E, R>() -> (EventSink<E, R>, EventStream<E, R>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();
    (
        EventSink {
            events: Some(event_tx),
            done: Some(done_tx),
        },
        EventStream {
            events: event_rx,
            done: done_rx,
        },
    )
}

impl<E, R> EventSink<E, R> {
    /// Push an event. Non-blocking, order-preserving; discarded once the
    /// sink is sealed or the consumer is gone.
    pub fn push(&self, event: E) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Seal the sink with the stream's result value. The consumer observes
    /// all previously pushed events, then the end of the stream. Calling
    /// `end` again is a no-op.
    pub fn end(&mut self, value: R) {
        if let Some(done) = self.done.take() {
            let _ = done.send(value);
        }
        self.events = None;
    }

    /// Whether `end` has been called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.done.is_none()
    }
}

impl<E, R> EventStream<E, R> {
    /// Next event, or `None` once the sink is sealed (or dropped) and all
    /// buffered events have been observed.
    pub async fn next(&mut self) -> Option<E> {
        self.events.recv().await
    }

    /// The sealed result value. `None` if the producer was dropped without
    /// sealing.
    pub async fn result(self) -> Option<R> {
        self.done.await.ok()
    }

    /// Drain all remaining events, then yield the result value.
    pub async fn collect(mut self) -> (Vec<E>, Option<R>) {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        let result = self.result().await;
        (events, result)
    }
}
