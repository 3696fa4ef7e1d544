use crate::{api::DEFAULT_API_URL, session::ExpiryPolicy};
use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use url::Url;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STATE_DIR: &str = "state-dir";
pub const ARG_EXPIRY: &str = "expiry";

#[derive(Debug, Clone)]
pub struct Options {
    pub api_url: Url,
    pub state_dir: Option<PathBuf>,
    pub expiry: ExpiryPolicy,
}

impl Options {
    /// Parse session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the API URL is not an absolute http(s) URL.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let raw = matches
            .get_one::<String>(ARG_API_URL)
            .map_or(DEFAULT_API_URL, String::as_str);
        let api_url = Url::parse(raw.trim()).with_context(|| format!("invalid --{ARG_API_URL}: {raw}"))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            anyhow::bail!("invalid --{ARG_API_URL}: expected http(s), got {raw}");
        }

        Ok(Self {
            api_url,
            state_dir: matches.get_one::<PathBuf>(ARG_STATE_DIR).cloned(),
            expiry: matches
                .get_one::<ExpiryPolicy>(ARG_EXPIRY)
                .copied()
                .unwrap_or_default(),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the edurag API")
                .env("EDURAG_API_URL")
                .default_value(DEFAULT_API_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long(ARG_STATE_DIR)
                .help("Directory holding stored credentials (default: ~/.edurag)")
                .env("EDURAG_STATE_DIR")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_EXPIRY)
                .long(ARG_EXPIRY)
                .help("What to do with expired credentials: enforce or ignore")
                .env("EDURAG_EXPIRY")
                .default_value("enforce")
                .global(true)
                .value_parser(|value: &str| value.parse::<ExpiryPolicy>()),
        )
}
