//! Server-sent events transport.

use super::{
    sse::SseParser, HintEvent, HintKind, HintQuery, Link, StreamConfig, StreamError, Transport,
    TransportKind,
};
use crate::APP_USER_AGENT;
use futures_util::{future::BoxFuture, StreamExt};
use reqwest::{
    header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE},
    Client, RequestBuilder,
};
use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use tracing::{debug, debug_span, Instrument};
use url::Url;

const EVENT_STREAM: &str = "text/event-stream";

/// One `GET` subscription per connection; the body is read until the server
/// ends it or the client closes.
#[derive(Debug)]
pub struct PushTransport {
    client: Client,
    config: StreamConfig,
}

impl PushTransport {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StreamConfig) -> Result<Self, StreamError> {
        // No total timeout: the stream stays open for as long as hints flow.
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| StreamError::Init(err.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

impl Transport for PushTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Push
    }

    fn endpoint(&self, query: &HintQuery) -> Result<Url, StreamError> {
        self.config.push_endpoint(query)
    }

    fn open(
        &self,
        endpoint: Url,
        _query: HintQuery,
        link: Link,
        outbound: mpsc::Receiver<String>,
    ) -> BoxFuture<'static, ()> {
        let mut request = self
            .client
            .get(endpoint)
            .header(ACCEPT, EVENT_STREAM)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(credential) = &self.config.credential {
            request = request.bearer_auth(credential.expose_secret());
        }
        let span = debug_span!("push", id = %link.id());
        Box::pin(subscribe(request, link, outbound).instrument(span))
    }
}

async fn subscribe(request: RequestBuilder, mut link: Link, mut outbound: mpsc::Receiver<String>) {
    let response = tokio::select! {
        response = request.send() => response,
        () = closed(&mut outbound) => return,
    };

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            link.failed(StreamError::Connect(err.to_string()));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        link.failed(StreamError::Connect(format!("unexpected status {status}")));
        return;
    }

    let is_event_stream = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(EVENT_STREAM));
    if !is_event_stream {
        link.failed(StreamError::Connect(format!(
            "expected {EVENT_STREAM} response"
        )));
        return;
    }

    if !link.opened() {
        return;
    }

    let mut body = response.bytes_stream();
    let mut parser = SseParser::new();
    loop {
        tokio::select! {
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    for event in parser.feed(&bytes) {
                        let Some(kind) = HintKind::from_event_name(&event.event) else {
                            debug!("ignoring event: {}", event.event);
                            continue;
                        };
                        if !link.event(HintEvent { kind, payload: event.data }) {
                            return;
                        }
                    }
                }
                Some(Err(err)) => {
                    link.failed(StreamError::Transport(err.to_string()));
                    return;
                }
                None => {
                    debug!("server ended the event stream");
                    return;
                }
            },
            text = outbound.recv() => {
                if text.is_none() {
                    return;
                }
                debug!("push transport has no upstream channel, dropping text");
            }
        }
    }
}

/// Resolves once the client drops its side of the channel.
async fn closed(outbound: &mut mpsc::Receiver<String>) {
    while outbound.recv().await.is_some() {}
}
