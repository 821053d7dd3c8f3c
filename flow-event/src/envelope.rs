//! Envelope (run_id, seq) stamped onto each streamed message.
//! EnvelopeState holds the per-run counter; seq is monotonically increasing
//! within one stream, terminal marker included.

use serde::Serialize;

use crate::event::StreamMessage;

/// A stream message together with its envelope fields.
///
/// `seq` orders messages within one run's stream; `run_id` lets multiplexing
/// transports route messages from several runs over one connection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enveloped {
    pub run_id: String,
    /// Per-run sequence number, starting at 1.
    pub seq: u64,
    #[serde(flatten)]
    pub message: StreamMessage,
}

/// Envelope state for one run: run id plus the next sequence number.
#[derive(Debug)]
pub struct EnvelopeState {
    run_id: String,
    next_seq: u64,
}

impl EnvelopeState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            next_seq: 1,
        }
    }

    /// Wraps a message with the envelope and advances the counter.
    pub fn wrap(&mut self, message: StreamMessage) -> Enveloped {
        let seq = self.next_seq;
        self.next_seq += 1;
        Enveloped {
            run_id: self.run_id.clone(),
            seq,
            message,
        }
    }
}
