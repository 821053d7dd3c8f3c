//! Run event protocol: log events, stream messages, envelope.
//!
//! This crate defines the wire shape of run observation: one [`LogEvent`] per
//! node start/end/error, a [`StreamMessage`] that is either a log event or the
//! terminal marker closing a stream, and an envelope (`run_id` + per-run
//! sequence number) stamped onto streamed messages.
//! It does not depend on the engine; the engine produces these types and
//! transports serialize them.

pub mod envelope;
pub mod event;

pub use envelope::{EnvelopeState, Enveloped};
pub use event::{LogEvent, RunStatus, StepStatus, StreamMessage};
