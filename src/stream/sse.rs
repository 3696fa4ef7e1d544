//! Incremental `text/event-stream` framing.

use std::mem;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `message` when the server sent no `event:` field.
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Splits a byte stream into events. Chunk boundaries may fall anywhere,
/// including inside a multi-byte character or between `\r` and `\n`.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    /// A chunk ended on `\r`; a leading `\n` in the next one belongs to it.
    pending_cr: bool,
    /// The leading byte-order mark, if any, has been consumed.
    started: bool,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if chunk.is_empty() {
            return Vec::new();
        }
        let mut chunk = chunk;
        if self.pending_cr {
            self.pending_cr = false;
            if let Some(rest) = chunk.strip_prefix(b"\n") {
                chunk = rest;
            }
        }
        self.buffer.extend_from_slice(chunk);

        if !self.started {
            // the mark itself may be split across chunks
            if self.buffer.len() < BOM.len() && BOM.starts_with(&self.buffer) {
                return Vec::new();
            }
            self.started = true;
            if self.buffer.starts_with(BOM) {
                self.buffer.drain(..BOM.len());
            }
        }

        let mut events = Vec::new();
        let mut start = 0;
        let mut index = 0;
        while index < self.buffer.len() {
            match self.buffer[index] {
                b'\n' => {
                    let line = self.buffer[start..index].to_vec();
                    self.line(&line, &mut events);
                    index += 1;
                    start = index;
                }
                b'\r' => {
                    let line = self.buffer[start..index].to_vec();
                    self.line(&line, &mut events);
                    index += 1;
                    if index == self.buffer.len() {
                        self.pending_cr = true;
                    } else if self.buffer[index] == b'\n' {
                        index += 1;
                    }
                    start = index;
                }
                _ => index += 1,
            }
        }
        self.buffer.drain(..start);
        events
    }

    fn line(&mut self, line: &[u8], events: &mut Vec<SseEvent>) {
        let line = String::from_utf8_lossy(line);
        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
            id: self.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_and_data(events: &[SseEvent]) -> Vec<(&str, &str)> {
        events
            .iter()
            .map(|event| (event.event.as_str(), event.data.as_str()))
            .collect()
    }

    #[test]
    fn parses_named_events_in_order() {
        let mut parser = SseParser::new();
        let events = parser.feed(
            b"event: context\ndata: C1\n\nevent: hint\ndata: H1\n\nevent: hint\ndata: H2\n\n",
        );
        assert_eq!(
            names_and_data(&events),
            vec![("context", "C1"), ("hint", "H1"), ("hint", "H2")]
        );
    }

    #[test]
    fn joins_multiline_data_and_skips_comments() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keep-alive\nevent: hint\ndata: first\ndata:second\nretry: 10\n\n");
        assert_eq!(names_and_data(&events), vec![("hint", "first\nsecond")]);
    }

    #[test]
    fn accepts_crlf_and_cr_line_endings() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: hint\r\ndata: a\r\n\r\nevent: context\rdata: b\r\r");
        assert_eq!(names_and_data(&events), vec![("hint", "a"), ("context", "b")]);
    }

    #[test]
    fn handles_chunk_boundaries() {
        let mut parser = SseParser::new();
        let stream = "event: hint\r\ndata: caf\u{e9} \u{2713}\r\n\r\n".as_bytes();
        let mut events = Vec::new();
        for byte in stream {
            events.extend(parser.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(names_and_data(&events), vec![("hint", "caf\u{e9} \u{2713}")]);
    }

    #[test]
    fn empty_chunk_keeps_split_crlf() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"event: hint\r").is_empty());
        assert!(parser.feed(b"").is_empty());
        let events = parser.feed(b"\ndata: a\r\ndata: b\r\n\r\n");
        assert_eq!(names_and_data(&events), vec![("hint", "a\nb")]);
    }

    #[test]
    fn strips_leading_byte_order_mark() {
        let mut parser = SseParser::new();
        let events = parser.feed("\u{feff}event: hint\ndata: H1\n\n".as_bytes());
        assert_eq!(names_and_data(&events), vec![("hint", "H1")]);

        // split mark, and only at stream start
        let mut parser = SseParser::new();
        assert!(parser.feed(&BOM[..1]).is_empty());
        assert!(parser.feed(&BOM[1..]).is_empty());
        let mut events = parser.feed(b"event: hint\ndata: H1\n\n");
        events.extend(parser.feed("\u{feff}event: hint\ndata: H2\n\n".as_bytes()));
        assert_eq!(names_and_data(&events), vec![("hint", "H1"), ("message", "H2")]);
    }

    #[test]
    fn default_name_and_id() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"id: 7\ndata: plain\n\n");
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn blank_events_and_trailing_partial_are_not_dispatched() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"event: hint\n\n").is_empty());
        assert!(parser.feed(b"event: hint\ndata: unfinished\n").is_empty());
    }
}
