//! The seam between `StreamClient` and a concrete wire protocol.
//!
//! A transport runs one connection as a spawned task. It reports back through
//! a [`Link`], which forwards to the subscriber only while the connection is
//! still the client's active one.

use super::{ConnectionState, HintEvent, HintQuery, StreamError, StreamUpdate, TransportKind};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;
use url::Url;
use uuid::Uuid;

pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Resolves the URL a connection for `query` is opened against.
    ///
    /// # Errors
    /// Returns an error if the configured API URL cannot produce an endpoint.
    fn endpoint(&self, query: &HintQuery) -> Result<Url, StreamError>;

    /// Runs one connection to completion.
    ///
    /// `outbound` yields texts to send; when it closes the connection must
    /// shut down gracefully and the future return.
    fn open(
        &self,
        endpoint: Url,
        query: HintQuery,
        link: Link,
        outbound: mpsc::Receiver<String>,
    ) -> BoxFuture<'static, ()>;
}

/// Delivery point shared by the client and all of its connections.
#[derive(Debug)]
pub(crate) struct Shared {
    active: Mutex<Option<Uuid>>,
    updates: mpsc::UnboundedSender<StreamUpdate>,
    state: watch::Sender<ConnectionState>,
}

impl Shared {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<StreamUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Idle);
        let shared = Self {
            active: Mutex::new(None),
            updates,
            state,
        };
        (Arc::new(shared), rx)
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub(crate) fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub(crate) fn is_active(&self, id: Uuid) -> bool {
        *self.active.lock() == Some(id)
    }

    /// Makes `id` the active connection and publishes `connecting`.
    pub(crate) fn begin(&self, id: Uuid) {
        let mut active = self.active.lock();
        *active = Some(id);
        self.transition(ConnectionState::Connecting);
    }

    /// Detaches `id` and publishes `closed`. Returns false if `id` was not
    /// the active connection.
    pub(crate) fn retire(&self, id: Uuid) -> bool {
        let mut active = self.active.lock();
        if *active != Some(id) {
            return false;
        }
        *active = None;
        self.transition(ConnectionState::Closed);
        true
    }

    /// Publishes `errored`, the error flag and `closed`, then detaches `id`.
    pub(crate) fn fail(&self, id: Uuid, error: &StreamError) -> bool {
        let mut active = self.active.lock();
        if *active != Some(id) {
            return false;
        }
        *active = None;
        self.transition(ConnectionState::Errored);
        self.publish(StreamUpdate::Error(error.to_string()));
        self.transition(ConnectionState::Closed);
        true
    }

    fn open(&self, id: Uuid) -> bool {
        let active = self.active.lock();
        if *active != Some(id) {
            return false;
        }
        self.transition(ConnectionState::Open);
        true
    }

    fn event(&self, id: Uuid, event: HintEvent) -> bool {
        let active = self.active.lock();
        if *active != Some(id) {
            return false;
        }
        self.publish(StreamUpdate::Event(event));
        true
    }

    // Callers hold the `active` lock so nothing interleaves with a teardown.
    fn transition(&self, state: ConnectionState) {
        self.state.send_replace(state);
        self.publish(StreamUpdate::State(state));
    }

    fn publish(&self, update: StreamUpdate) {
        // The subscriber may have gone away; the client keeps working.
        let _ = self.updates.send(update);
    }
}

/// A connection's handle on the client.
///
/// Every report is dropped once the connection is no longer active. Dropping
/// the link ends the connection: `closed` if it was still active, and a
/// pending `connect` resolves with [`StreamError::Closed`].
pub struct Link {
    id: Uuid,
    shared: Arc<Shared>,
    ready: Option<oneshot::Sender<Result<(), StreamError>>>,
}

impl Link {
    pub(crate) fn new(
        id: Uuid,
        shared: Arc<Shared>,
        ready: oneshot::Sender<Result<(), StreamError>>,
    ) -> Self {
        Self {
            id,
            shared,
            ready: Some(ready),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// True while this connection is still the client's active one.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.is_active(self.id)
    }

    /// Marks the connection open and resolves the pending `connect`.
    pub fn opened(&mut self) -> bool {
        let open = self.shared.open(self.id);
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(if open { Ok(()) } else { Err(StreamError::Closed) });
        }
        open
    }

    /// Forwards one event; false means the connection was torn down.
    pub fn event(&self, event: HintEvent) -> bool {
        let delivered = self.shared.event(self.id, event);
        if !delivered {
            debug!(id = %self.id, "dropping event from stale connection");
        }
        delivered
    }

    /// Reports a transport failure and ends the connection.
    pub fn failed(mut self, error: StreamError) {
        debug!(id = %self.id, "connection failed: {error}");
        self.shared.fail(self.id, &error);
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(Err(error));
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(Err(StreamError::Closed));
        }
        if self.shared.retire(self.id) {
            debug!(id = %self.id, "connection ended by peer");
        }
    }
}
