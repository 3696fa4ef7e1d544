//! Realtime hint streaming over server-sent events or a websocket.

pub mod client;
pub mod config;
pub mod duplex;
pub mod error;
pub mod event;
pub mod push;
pub mod sse;
pub mod transcript;
pub mod transport;

pub use client::{StreamClient, Updates};
pub use config::{HintQuery, StreamConfig, TransportKind};
pub use duplex::DuplexTransport;
pub use error::StreamError;
pub use event::{ConnectionState, HintEvent, HintKind, StreamUpdate};
pub use push::PushTransport;
pub use sse::{SseEvent, SseParser};
pub use transcript::Transcript;
pub use transport::{Link, Transport};
