//! Websocket transport.

use super::{HintEvent, HintQuery, Link, StreamConfig, StreamError, Transport, TransportKind};
use futures_util::{future::BoxFuture, SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::AUTHORIZATION, HeaderValue},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, debug_span, warn, Instrument};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Serialize)]
struct Frame<'a> {
    text: &'a str,
}

#[derive(Debug)]
pub struct DuplexTransport {
    config: StreamConfig,
}

impl DuplexTransport {
    #[must_use]
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Transport for DuplexTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Duplex
    }

    fn endpoint(&self, _query: &HintQuery) -> Result<Url, StreamError> {
        self.config.duplex_endpoint()
    }

    fn open(
        &self,
        endpoint: Url,
        query: HintQuery,
        link: Link,
        outbound: mpsc::Receiver<String>,
    ) -> BoxFuture<'static, ()> {
        let credential = self.config.credential.clone();
        let span = debug_span!("duplex", id = %link.id());
        Box::pin(session(endpoint, query, credential, link, outbound).instrument(span))
    }
}

async fn session(
    endpoint: Url,
    query: HintQuery,
    credential: Option<SecretString>,
    mut link: Link,
    mut outbound: mpsc::Receiver<String>,
) {
    let mut request = match endpoint.as_str().into_client_request() {
        Ok(request) => request,
        Err(err) => {
            link.failed(StreamError::Endpoint(err.to_string()));
            return;
        }
    };
    if let Some(credential) = credential {
        match HeaderValue::from_str(&format!("Bearer {}", credential.expose_secret())) {
            Ok(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                link.failed(StreamError::Init(
                    "credential is not a valid header value".to_string(),
                ));
                return;
            }
        }
    }

    let connected = tokio::select! {
        connected = connect_async(request) => connected,
        () = closed(&mut outbound) => return,
    };
    let mut socket = match connected {
        Ok((socket, _response)) => socket,
        Err(err) => {
            link.failed(StreamError::Connect(err.to_string()));
            return;
        }
    };

    if !link.opened() {
        shutdown(&mut socket).await;
        return;
    }

    if !query.text.trim().is_empty() {
        if let Err(err) = send_text(&mut socket, &query.text).await {
            link.failed(err);
            return;
        }
    }

    loop {
        tokio::select! {
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if !link.event(HintEvent::hint(text)) {
                        shutdown(&mut socket).await;
                        return;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        if !link.event(HintEvent::hint(text)) {
                            shutdown(&mut socket).await;
                            return;
                        }
                    }
                    Err(_) => warn!("dropping non UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => debug!(?frame, "server closed the socket"),
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    link.failed(StreamError::Transport(err.to_string()));
                    return;
                }
                None => return,
            },
            text = outbound.recv() => match text {
                Some(text) => {
                    if let Err(err) = send_text(&mut socket, &text).await {
                        link.failed(err);
                        return;
                    }
                }
                None => {
                    shutdown(&mut socket).await;
                    return;
                }
            },
        }
    }
}

async fn send_text(socket: &mut Socket, text: &str) -> Result<(), StreamError> {
    let frame =
        serde_json::to_string(&Frame { text }).map_err(|err| StreamError::Transport(err.to_string()))?;
    debug!("sending frame ({} bytes)", frame.len());
    socket
        .send(Message::Text(frame))
        .await
        .map_err(|err| StreamError::Transport(err.to_string()))
}

/// Sends a close frame and waits for the peer to finish the handshake.
async fn shutdown(socket: &mut Socket) {
    if let Err(err) = socket.close(None).await {
        debug!("close frame not sent: {err}");
        return;
    }
    while let Some(Ok(_)) = socket.next().await {}
}

async fn closed(outbound: &mut mpsc::Receiver<String>) {
    while outbound.recv().await.is_some() {}
}
