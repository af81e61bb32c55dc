//! Server-sent-event framing for the orchestrate stream. Frames are built as
//! complete strings and pushed through a channel that backs the response body,
//! so emission order is exactly arrival order.

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::core::events::AgentEvent;

pub fn format_sse(event: &str, data: &str) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

/// Writer half of an orchestrate stream. `close` is idempotent; pushes after
/// close (or after the client went away) are silently dropped.
pub struct SseStream {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl SseStream {
    pub fn channel() -> (Self, UnboundedReceiverStream<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, UnboundedReceiverStream::new(rx))
    }

    fn push_frame(&self, frame: String) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(frame);
        }
    }

    /// One agent event frame: SSE event name `agent:<type>`, payload the
    /// event serialized as JSON.
    pub fn push_event(&self, event: &AgentEvent) {
        let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
        self.push_frame(format_sse(&format!("agent:{}", event.kind.as_str()), &data));
    }

    /// Out-of-band notice, e.g. the demo-mode banner.
    pub fn push_system_notice(&self, content: &str) {
        let data = serde_json::json!({ "role": "system", "content": content });
        self.push_frame(format_sse("system", &data.to_string()));
    }

    pub fn push_error(&self, message: &str) {
        let data = serde_json::json!({ "error": message });
        self.push_frame(format_sse("error", &data.to_string()));
    }

    /// Normal-completion sentinel.
    pub fn done(&self) {
        self.push_frame(format_sse("done", "[DONE]"));
    }

    pub fn close(&mut self) {
        self.tx = None;
    }
}
