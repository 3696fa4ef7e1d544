use super::{
    duplex::DuplexTransport, push::PushTransport, transport::Shared, ConnectionState, HintQuery,
    Link, StreamConfig, StreamError, StreamUpdate, Transport, TransportKind,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

const OUTBOUND_CAPACITY: usize = 32;

struct Connection {
    id: Uuid,
    endpoint: Url,
    outbound: mpsc::Sender<String>,
    task: JoinHandle<()>,
}

/// Receiving side of a client's updates, in delivery order.
#[derive(Debug)]
pub struct Updates {
    rx: mpsc::UnboundedReceiver<StreamUpdate>,
}

impl Updates {
    /// Waits for the next update; `None` once the client and all of its
    /// connections are gone.
    pub async fn recv(&mut self) -> Option<StreamUpdate> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<StreamUpdate> {
        self.rx.try_recv().ok()
    }
}

/// Owns at most one hint stream connection.
pub struct StreamClient {
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    connection: Option<Connection>,
    last_query: Option<HintQuery>,
    close_timeout: Duration,
}

impl StreamClient {
    /// Builds a client for the configured transport.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: StreamConfig) -> Result<(Self, Updates), StreamError> {
        let transport: Arc<dyn Transport> = match config.transport {
            TransportKind::Push => Arc::new(PushTransport::new(&config)?),
            TransportKind::Duplex => Arc::new(DuplexTransport::new(&config)),
        };
        Ok(Self::with_transport(transport, config.close_timeout))
    }

    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, close_timeout: Duration) -> (Self, Updates) {
        let (shared, rx) = Shared::new();
        let client = Self {
            transport,
            shared,
            connection: None,
            last_query: None,
            close_timeout,
        };
        (client, Updates { rx })
    }

    #[must_use]
    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.watch_state()
    }

    /// Endpoint of the current connection, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Url> {
        self.connection.as_ref().map(|connection| &connection.endpoint)
    }

    #[must_use]
    pub fn connection_id(&self) -> Option<Uuid> {
        self.connection.as_ref().map(|connection| connection.id)
    }

    /// Opens a connection for `query`, tearing down any existing one first.
    ///
    /// # Errors
    /// Returns an error if the connection never reaches `open`. The failure is
    /// also published to the subscriber.
    #[instrument(skip_all, fields(transport = %self.transport.kind()))]
    pub async fn connect(&mut self, query: HintQuery) -> Result<(), StreamError> {
        self.disconnect().await;

        let id = Uuid::new_v4();
        self.shared.begin(id);

        let endpoint = match self.transport.endpoint(&query) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                self.shared.fail(id, &err);
                return Err(err);
            }
        };
        debug!(%id, %endpoint, "connecting hint stream");

        let (ready_tx, ready_rx) = oneshot::channel();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let link = Link::new(id, Arc::clone(&self.shared), ready_tx);
        let task = tokio::spawn(
            self.transport
                .open(endpoint.clone(), query.clone(), link, outbound_rx),
        );

        self.connection = Some(Connection {
            id,
            endpoint,
            outbound: outbound_tx,
            task,
        });
        self.last_query = Some(query);

        let result = ready_rx.await.unwrap_or(Err(StreamError::Closed));
        match &result {
            Ok(()) => info!(%id, "hint stream open"),
            Err(err) => {
                warn!(%id, "hint stream failed to open: {err}");
                self.disconnect().await;
            }
        }
        result
    }

    /// Push clients re-subscribe with the new text and the previous form id;
    /// duplex clients write one frame on the open connection.
    ///
    /// # Errors
    /// Returns [`StreamError::NotConnected`] for a duplex client that is not
    /// open, or the connect error of a push re-subscription.
    pub async fn send(&mut self, text: impl Into<String>) -> Result<(), StreamError> {
        let text = text.into();
        match self.transport.kind() {
            TransportKind::Push => {
                let form_id = self
                    .last_query
                    .as_ref()
                    .and_then(|query| query.form_id.clone());
                self.connect(HintQuery { text, form_id }).await
            }
            TransportKind::Duplex => {
                let Some(connection) = &self.connection else {
                    return Err(StreamError::NotConnected);
                };
                if self.shared.state() != ConnectionState::Open
                    || !self.shared.is_active(connection.id)
                {
                    return Err(StreamError::NotConnected);
                }
                connection
                    .outbound
                    .send(text)
                    .await
                    .map_err(|_| StreamError::NotConnected)
            }
        }
    }

    /// Closes the current connection, if any, and waits for its task to end.
    ///
    /// The task gets `close_timeout` to close gracefully and is aborted after
    /// that. Calling this without a connection does nothing.
    pub async fn disconnect(&mut self) {
        let Some(Connection {
            id,
            outbound,
            mut task,
            ..
        }) = self.connection.take()
        else {
            return;
        };

        if self.shared.retire(id) {
            debug!(%id, "hint stream closed");
        }
        drop(outbound);

        match timeout(self.close_timeout, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%id, "hint stream task failed: {err}"),
            Err(_) => {
                warn!(%id, "hint stream did not close in time, aborting");
                task.abort();
                let _ = task.await;
            }
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.shared.retire(connection.id);
            connection.task.abort();
        }
    }
}
