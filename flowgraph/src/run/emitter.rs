//! Per-run log emitter: append events to the record's ordered log and fan
//! them out to live subscribers.
//!
//! Each subscriber gets its own bounded queue; a subscriber that cannot keep
//! up has events dropped rather than stalling the run. Streams end with a
//! terminal marker once the run is final; subscribing to an already-finished
//! run yields just the marker.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;
use tokio_stream::wrappers::ReceiverStream;

use flow_event::{EnvelopeState, Enveloped, LogEvent, RunStatus, StreamMessage};

use crate::run::RunRecord;

/// Bounded buffer size per subscriber. Prevents unbounded memory growth when
/// a consumer cannot keep up with the run.
pub const EVENT_QUEUE_CAPACITY: usize = 128;

enum Subscribers {
    Live(Vec<mpsc::Sender<Enveloped>>),
    Finished(RunStatus),
}

struct Inner {
    envelope: EnvelopeState,
    subscribers: Subscribers,
}

/// Appends ordered events for one run and publishes them, enveloped, to any
/// live subscribers in append order.
pub(crate) struct LogEmitter {
    record: Arc<RwLock<RunRecord>>,
    inner: Mutex<Inner>,
}

impl LogEmitter {
    pub(crate) fn new(run_id: impl Into<String>, record: Arc<RwLock<RunRecord>>) -> Self {
        Self {
            record,
            inner: Mutex::new(Inner {
                envelope: EnvelopeState::new(run_id),
                subscribers: Subscribers::Live(Vec::new()),
            }),
        }
    }

    /// Appends to the run's log and publishes to subscribers.
    pub(crate) async fn append(&self, event: LogEvent) {
        self.record.write().await.log.push(event.clone());
        self.publish(StreamMessage::Log(event));
    }

    /// Publishes the terminal marker and closes all subscriber streams.
    /// Later subscribers receive just the marker.
    pub(crate) fn finish(&self, status: RunStatus) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let done = inner.envelope.wrap(StreamMessage::Done { status });
        if let Subscribers::Live(subscribers) = &inner.subscribers {
            for tx in subscribers {
                let _ = tx.try_send(done.clone());
            }
        }
        inner.subscribers = Subscribers::Finished(status);
    }

    /// Opens a stream of enveloped messages starting at the current point in
    /// time; events appended before subscription are only in the stored log.
    pub(crate) fn subscribe(&self) -> ReceiverStream<Enveloped> {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        if let Ok(mut inner) = self.inner.lock() {
            match &mut inner.subscribers {
                Subscribers::Live(subscribers) => subscribers.push(tx),
                Subscribers::Finished(status) => {
                    let status = *status;
                    let done = inner.envelope.wrap(StreamMessage::Done { status });
                    let _ = tx.try_send(done);
                    // tx dropped here; the stream ends after the marker.
                }
            }
        }
        ReceiverStream::new(rx)
    }

    fn publish(&self, message: StreamMessage) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let enveloped = inner.envelope.wrap(message);
        let Subscribers::Live(subscribers) = &mut inner.subscribers else {
            return;
        };
        subscribers.retain(|tx| match tx.try_send(enveloped.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    run_id = %enveloped.run_id,
                    seq = enveloped.seq,
                    "subscriber queue full, dropping stream event"
                );
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }
}
