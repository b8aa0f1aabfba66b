//! Incremental parser for the Server-Sent Events wire format:
//! - `event:` lines name the event
//! - `data:` lines carry the payload (several lines are joined with `\n`)
//! - `id:` lines carry the event id
//! - a blank line ends the event
//! - lines starting with `:` are comments (keep-alives)

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (from the `event:` field)
    pub event_type: Option<String>,
    /// Event data (from `data:` field(s), joined with newlines)
    pub data: String,
    /// Event ID (from the `id:` field)
    pub id: Option<String>,
}

impl SseEvent {
    /// The event name, with the SSE default of "message" for unnamed events.
    pub fn name(&self) -> &str {
        match self.event_type.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "message",
        }
    }
}

/// Streaming SSE parser that accumulates bytes and yields complete events.
///
/// Input is buffered as raw bytes and only decoded once a full line is available, so a
/// multi-byte character split across network chunks is decoded intact.
#[derive(Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    current_event_type: Option<String>,
    current_data: Vec<String>,
    current_id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and return any complete events
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut consumed = 0;

        while let Some(offset) = self.buffer[consumed..].iter().position(|&b| b == b'\n') {
            let line_end = consumed + offset;
            let line = self.buffer[consumed..line_end].to_vec();
            consumed = line_end + 1;

            let Ok(line) = String::from_utf8(line) else {
                tracing::warn!("Received invalid UTF-8 in SSE stream; dropping line");
                continue;
            };

            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                events.push(event);
            }
        }

        self.buffer.drain(..consumed);
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            // Empty line = end of event
            if self.current_data.is_empty() && self.current_event_type.is_none() {
                return None;
            }
            let event = SseEvent {
                event_type: self.current_event_type.take(),
                data: self.current_data.join("\n"),
                id: self.current_id.take(),
            };
            self.current_data.clear();
            return Some(event);
        }

        if line.starts_with(':') {
            // Comment line (keepalive), ignore
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.current_event_type = Some(value.trim().to_string()),
            "data" => self.current_data.push(value.to_string()),
            "id" => self.current_id = Some(value.trim().to_string()),
            // `retry:` and unknown fields are ignored; reconnection is not ours to manage.
            _ => {},
        }

        None
    }

    /// Whether a partially received event is pending.
    pub fn has_partial_event(&self) -> bool {
        !self.buffer.is_empty() || !self.current_data.is_empty() || self.current_event_type.is_some()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.current_event_type = None;
        self.current_data.clear();
        self.current_id = None;
    }
}
