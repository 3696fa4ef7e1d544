use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintKind {
    Hint,
    Context,
}

impl HintKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hint => "hint",
            Self::Context => "context",
        }
    }

    /// Maps a server-sent event name to a kind; other names are not hints.
    #[must_use]
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "hint" => Some(Self::Hint),
            "context" => Some(Self::Context),
            _ => None,
        }
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of streamed guidance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintEvent {
    pub kind: HintKind,
    pub payload: String,
}

impl HintEvent {
    #[must_use]
    pub fn hint(payload: impl Into<String>) -> Self {
        Self {
            kind: HintKind::Hint,
            payload: payload.into(),
        }
    }

    #[must_use]
    pub fn context(payload: impl Into<String>) -> Self {
        Self {
            kind: HintKind::Context,
            payload: payload.into(),
        }
    }
}

/// Renders as `kind:payload`.
impl fmt::Display for HintEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.payload)
    }
}

/// Lifecycle of the connection held by a `StreamClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Everything a subscriber observes, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    State(ConnectionState),
    Event(HintEvent),
    /// Transport failure; always followed by `State(Closed)`.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_map_to_kinds() {
        assert_eq!(HintKind::from_event_name("hint"), Some(HintKind::Hint));
        assert_eq!(HintKind::from_event_name("context"), Some(HintKind::Context));
        assert_eq!(HintKind::from_event_name("message"), None);
        assert_eq!(HintKind::from_event_name("Hint"), None);
    }

    #[test]
    fn event_renders_kind_and_payload() {
        assert_eq!(HintEvent::context("C1").to_string(), "context:C1");
        assert_eq!(HintEvent::hint("line 1\nline 2").to_string(), "hint:line 1\nline 2");
    }
}
