#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::Router;
use base64ct::{Base64UrlUnpadded, Encoding};
use edurag::stream::{StreamUpdate, Updates};
use serde_json::Value;
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use url::Url;

/// Serves `app` on an ephemeral local port for the rest of the test.
pub async fn serve(app: Router) -> Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind a local port")?;
    let addr: SocketAddr = listener.local_addr().context("Failed to read local port")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}")).context("Failed to build server URL")
}

/// A URL nothing listens on.
pub async fn unused_url() -> Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(Url::parse(&format!("http://{addr}"))?)
}

/// Unsigned compact token carrying `claims`.
pub fn token(claims: &Value) -> Result<String> {
    let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
    Ok(format!("eyJhbGciOiJIUzI1NiJ9.{payload}.signature"))
}

pub async fn next(updates: &mut Updates) -> Result<StreamUpdate> {
    tokio::time::timeout(Duration::from_secs(5), updates.recv())
        .await
        .context("timed out waiting for a stream update")?
        .context("update channel closed")
}

/// Collects updates until `done` matches one (inclusive).
pub async fn until(
    updates: &mut Updates,
    done: impl Fn(&StreamUpdate) -> bool,
) -> Result<Vec<StreamUpdate>> {
    let mut seen = Vec::new();
    loop {
        let update = next(updates).await?;
        let stop = done(&update);
        seen.push(update);
        if stop {
            return Ok(seen);
        }
    }
}

/// Polls `check` for up to a second.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
