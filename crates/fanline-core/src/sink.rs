//! The seam between the line relay and whatever consumes its messages.

/// Receives each inbound line observed by the relay's read loop.
///
/// Invoked synchronously from the read loop, so implementations must not
/// block for long — the broadcast hub satisfies this by doing only
/// lock-guarded map/queue work (never connection I/O) inside `on_message`.
pub trait MessageSink: Send + Sync {
    /// Called once per newline-delimited message, in stream order.
    fn on_message(&self, line: String);
}

/// A sink that discards every message. Useful as a default and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn on_message(&self, _line: String) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl MessageSink for Recorder {
        fn on_message(&self, line: String) {
            self.lines.lock().unwrap().push(line);
        }
    }

    #[test]
    fn sink_receives_in_order() {
        let rec = Recorder {
            lines: Mutex::new(Vec::new()),
        };
        rec.on_message("a".into());
        rec.on_message("b".into());
        assert_eq!(*rec.lines.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn null_sink_accepts_anything() {
        NullSink.on_message("ignored".into());
    }

    #[test]
    fn sink_is_object_safe() {
        let sink: Box<dyn MessageSink> = Box::new(NullSink);
        sink.on_message("via trait object".into());
    }
}
