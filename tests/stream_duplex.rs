mod support;

use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::IntoResponse,
    routing::get,
    Router,
};
use edurag::stream::{
    ConnectionState, HintEvent, HintQuery, StreamClient, StreamConfig, StreamError, StreamUpdate,
    TransportKind, Updates,
};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use support::{eventually, next, serve, until};
use url::Url;

#[derive(Clone, Default)]
struct Seen {
    frames: Arc<Mutex<Vec<String>>>,
    authorization: Arc<Mutex<Option<String>>>,
    closed_cleanly: Arc<AtomicBool>,
}

async fn upgrade(
    State(seen): State<Seen>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    *seen.authorization.lock() = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    ws.on_upgrade(move |socket| echo(socket, seen))
}

async fn echo(mut socket: WebSocket, seen: Seen) {
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(frame) => {
                let text = serde_json::from_str::<Value>(&frame)
                    .ok()
                    .and_then(|value| value.get("text").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_default();
                seen.frames.lock().push(text.clone());
                if socket
                    .send(Message::Text(format!("hint for {text}")))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Message::Close(_) => {
                seen.closed_cleanly.store(true, Ordering::SeqCst);
                return;
            }
            _ => {}
        }
    }
}

async fn echo_server() -> Result<(Url, Seen)> {
    let seen = Seen::default();
    let app = Router::new()
        .route("/realtime/ws/hint", get(upgrade))
        .with_state(seen.clone());
    Ok((serve(app).await?, seen))
}

fn duplex_client(api: Url, credential: Option<&str>) -> Result<(StreamClient, Updates)> {
    let config = StreamConfig::new(api, TransportKind::Duplex)
        .credential(credential.map(|c| SecretString::from(c.to_string())));
    Ok(StreamClient::new(config)?)
}

async fn next_event(updates: &mut Updates) -> Result<HintEvent> {
    loop {
        if let StreamUpdate::Event(event) = next(updates).await? {
            return Ok(event);
        }
    }
}

#[tokio::test]
async fn duplex_round_trip() -> Result<()> {
    let (api, seen) = echo_server().await?;
    let (mut client, mut updates) = duplex_client(api, Some("h.p.s"))?;

    client.connect(HintQuery::new("first")).await?;
    assert_eq!(client.state(), ConnectionState::Open);
    assert_eq!(
        client.endpoint().map(Url::scheme),
        Some("ws"),
    );
    assert_eq!(next_event(&mut updates).await?, HintEvent::hint("hint for first"));

    client.send("second").await?;
    assert_eq!(next_event(&mut updates).await?, HintEvent::hint("hint for second"));

    assert_eq!(*seen.frames.lock(), vec!["first", "second"]);
    assert_eq!(seen.authorization.lock().as_deref(), Some("Bearer h.p.s"));

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(eventually(|| seen.closed_cleanly.load(Ordering::SeqCst)).await);
    Ok(())
}

#[tokio::test]
async fn blank_query_text_is_not_sent() -> Result<()> {
    let (api, seen) = echo_server().await?;
    let (mut client, mut updates) = duplex_client(api, None)?;

    client.connect(HintQuery::new("   ")).await?;
    client.send("x").await?;
    assert_eq!(next_event(&mut updates).await?, HintEvent::hint("hint for x"));
    assert_eq!(*seen.frames.lock(), vec!["x"]);
    assert!(seen.authorization.lock().is_none());

    client.disconnect().await;
    Ok(())
}

#[tokio::test]
async fn send_requires_open_connection() -> Result<()> {
    let (api, _seen) = echo_server().await?;
    let (mut client, _updates) = duplex_client(api, None)?;

    assert_eq!(client.send("early").await, Err(StreamError::NotConnected));
    client.connect(HintQuery::default()).await?;
    client.disconnect().await;
    assert_eq!(client.send("late").await, Err(StreamError::NotConnected));
    Ok(())
}

#[tokio::test]
async fn server_close_ends_stream_without_error() -> Result<()> {
    let app = Router::new().route(
        "/realtime/ws/hint",
        get(|ws: WebSocketUpgrade| async move {
            ws.on_upgrade(|mut socket: WebSocket| async move {
                let _ = socket.send(Message::Text("only hint".to_string())).await;
                let _ = socket.send(Message::Close(None)).await;
                while let Some(Ok(_)) = socket.recv().await {}
            })
        }),
    );
    let (mut client, mut updates) = duplex_client(serve(app).await?, None)?;

    client.connect(HintQuery::default()).await?;
    let seen = until(&mut updates, |u| {
        *u == StreamUpdate::State(ConnectionState::Closed)
    })
    .await?;

    assert!(seen.contains(&StreamUpdate::Event(HintEvent::hint("only hint"))));
    assert!(!seen.iter().any(|u| matches!(u, StreamUpdate::Error(_))));

    // The connection is gone; disconnect adds nothing.
    client.disconnect().await;
    assert!(updates.try_recv().is_none());
    Ok(())
}

#[tokio::test]
async fn failed_handshake_is_reported() -> Result<()> {
    let app = Router::new().route("/health", get(|| async { "ok" }));
    let (mut client, mut updates) = duplex_client(serve(app).await?, None)?;

    let result = client.connect(HintQuery::new("q")).await;
    assert!(matches!(result, Err(StreamError::Connect(_))));

    let seen = until(&mut updates, |u| {
        *u == StreamUpdate::State(ConnectionState::Closed)
    })
    .await?;
    assert!(seen.contains(&StreamUpdate::State(ConnectionState::Errored)));
    assert!(seen.iter().any(|u| matches!(u, StreamUpdate::Error(_))));
    Ok(())
}
