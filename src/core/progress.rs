use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Message delivered from the worker to the caller's context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    /// One line of progress text, rendered append-only
    Line { text: String },
    /// The queue was drained; sent exactly once per run
    Completed,
}

/// Append-only, order-preserving progress sink.
///
/// The worker never touches caller state directly: every line and the final
/// completion notice travel over the channel and the caller consumes them on
/// its own schedule.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: UnboundedSender<RunEvent>,
}

impl ProgressSink {
    pub fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sink together with the receiving end for the caller.
    pub fn channel() -> (Self, UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Forwards one line of text. Lines are never split or reordered.
    pub fn write(&self, text: impl Into<String>) {
        if self.tx.send(RunEvent::Line { text: text.into() }).is_err() {
            debug!("Progress receiver dropped, line discarded");
        }
    }

    /// Signals that the run is over.
    pub(crate) fn complete(&self) {
        if self.tx.send(RunEvent::Completed).is_err() {
            debug!("Progress receiver dropped before completion");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_arrive_in_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.write("one");
        sink.write(String::from("two"));
        sink.complete();

        assert_eq!(rx.try_recv().unwrap(), RunEvent::Line { text: "one".into() });
        assert_eq!(rx.try_recv().unwrap(), RunEvent::Line { text: "two".into() });
        assert_eq!(rx.try_recv().unwrap(), RunEvent::Completed);
    }

    #[test]
    fn test_event_json_shape() {
        let line = serde_json::to_string(&RunEvent::Line { text: "50.00%".into() }).unwrap();
        assert_eq!(line, r#"{"type":"line","text":"50.00%"}"#);
        let done = serde_json::to_string(&RunEvent::Completed).unwrap();
        assert_eq!(done, r#"{"type":"completed"}"#);
    }

    #[test]
    fn test_write_after_receiver_dropped_is_harmless() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.write("lost");
        sink.complete();
    }
}
