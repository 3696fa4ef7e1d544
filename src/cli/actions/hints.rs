use crate::{
    cli::{commands::hints::Options, globals::GlobalArgs},
    session::Decision,
    stream::{
        ConnectionState, HintQuery, StreamClient, StreamConfig, StreamUpdate, Transcript,
        TransportKind, Updates,
    },
};
use anyhow::{bail, Context, Result};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Hints are streamed from exam pages, which sit in the student area.
const EXAM_PAGE: &str = "/student/exams";

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub options: Options,
}

/// Stream hints to stdout as `kind:payload` lines.
/// # Errors
/// Returns an error if the session may not open exam pages, the stream cannot
/// be opened, or it ends with a transport failure.
pub async fn execute(args: Args) -> Result<()> {
    let access = match args.globals.guard().check_page(EXAM_PAGE) {
        Decision::Allow(access) => access,
        Decision::Redirect(target) => {
            println!("redirect {target}");
            bail!("log in as a student, tutor or admin to stream hints")
        }
    };

    let Options {
        transport,
        form_id,
        text,
        close_timeout,
    } = args.options;

    let config = StreamConfig::new(args.globals.api_url.clone(), transport)
        .credential(access.credential().cloned())
        .close_timeout(close_timeout);
    let (mut client, mut updates) = StreamClient::new(config)?;

    let mut query = HintQuery::new(text);
    if let Some(form_id) = form_id {
        query = query.with_form_id(form_id);
    }

    let mut transcript = Transcript::new();
    if let Err(err) = client.connect(query).await {
        drain(&mut updates, &mut transcript);
        return Err(err).context("failed to open hint stream");
    }

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                render(&update, &mut transcript);
                if finished(&client, stdin_open) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Err(err) = client.send(line).await {
                        warn!("failed to send answer text: {err}");
                        if transport == TransportKind::Duplex {
                            break;
                        }
                    }
                }
                Ok(None) | Err(_) => {
                    stdin_open = false;
                    if finished(&client, stdin_open) || transport == TransportKind::Duplex {
                        break;
                    }
                }
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
        }
    }

    client.disconnect().await;
    drain(&mut updates, &mut transcript);

    if let Some(error) = transcript.error() {
        bail!("hint stream failed: {error}");
    }
    Ok(())
}

/// A push stream can be re-subscribed from stdin, so it only finishes once
/// stdin is closed too.
fn finished(client: &StreamClient, stdin_open: bool) -> bool {
    let stopped = matches!(
        client.state(),
        ConnectionState::Closed | ConnectionState::Errored
    );
    stopped && (client.kind() == TransportKind::Duplex || !stdin_open)
}

fn render(update: &StreamUpdate, transcript: &mut Transcript) {
    transcript.apply(update);
    match update {
        StreamUpdate::Event(event) => println!("{event}"),
        StreamUpdate::State(state) => debug!("hint stream {state}"),
        StreamUpdate::Error(message) => warn!("{message}"),
    }
}

fn drain(updates: &mut Updates, transcript: &mut Transcript) {
    while let Some(update) = updates.try_recv() {
        render(&update, transcript);
    }
}
