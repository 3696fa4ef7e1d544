use crate::stream::TransportKind;
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_TRANSPORT: &str = "transport";
pub const ARG_FORM_ID: &str = "form-id";
pub const ARG_CLOSE_TIMEOUT: &str = "close-timeout-ms";
pub const ARG_TEXT: &str = "text";

#[derive(Debug, Clone)]
pub struct Options {
    pub transport: TransportKind,
    pub form_id: Option<String>,
    pub text: String,
    pub close_timeout: Duration,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            transport: matches
                .get_one::<TransportKind>(ARG_TRANSPORT)
                .copied()
                .unwrap_or(TransportKind::Push),
            form_id: matches
                .get_one::<String>(ARG_FORM_ID)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            text: matches
                .get_many::<String>(ARG_TEXT)
                .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
                .unwrap_or_default(),
            close_timeout: Duration::from_millis(
                matches
                    .get_one::<u64>(ARG_CLOSE_TIMEOUT)
                    .copied()
                    .unwrap_or(2000),
            ),
        }
    }
}

#[must_use]
pub fn subcommand() -> Command {
    Command::new("hints")
        .about("Stream hints while composing an answer")
        .long_about(
            "Stream hints while composing an answer.\n\n\
             Each line read from stdin is sent as the new answer text: the push \
             transport re-subscribes with it, the duplex transport sends it over the \
             open socket. Stops on Ctrl-C, when the server ends the stream, or (duplex) \
             when stdin closes.",
        )
        .arg(
            Arg::new(ARG_TRANSPORT)
                .short('t')
                .long(ARG_TRANSPORT)
                .help("Realtime transport: push (server-sent events) or duplex (websocket)")
                .env("EDURAG_TRANSPORT")
                .default_value("push")
                .value_parser(|value: &str| value.parse::<TransportKind>()),
        )
        .arg(
            Arg::new(ARG_FORM_ID)
                .short('f')
                .long(ARG_FORM_ID)
                .help("Form the answer belongs to"),
        )
        .arg(
            Arg::new(ARG_CLOSE_TIMEOUT)
                .long(ARG_CLOSE_TIMEOUT)
                .help("How long to wait for a graceful close before aborting")
                .default_value("2000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_TEXT)
                .help("Initial answer text")
                .num_args(0..),
        )
}
