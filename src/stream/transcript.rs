use super::{ConnectionState, HintEvent, StreamUpdate};

/// What a hint panel shows: every event received so far, plus whether the
/// stream has stopped and why.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    events: Vec<HintEvent>,
    error: Option<String>,
    state: ConnectionState,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: &StreamUpdate) {
        match update {
            StreamUpdate::State(state) => {
                if *state == ConnectionState::Connecting {
                    self.error = None;
                }
                self.state = *state;
            }
            StreamUpdate::Event(event) => self.events.push(event.clone()),
            StreamUpdate::Error(message) => self.error = Some(message.clone()),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[HintEvent] {
        &self.events
    }

    /// Events rendered as `kind:payload`.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self.state, ConnectionState::Closed | ConnectionState::Errored)
    }
}
