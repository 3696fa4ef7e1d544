//! Maps parsed CLI arguments to the action the binary runs.

use crate::cli::{
    actions::{account, check, hints, Action},
    commands::{self, account::Credentials},
    globals::GlobalArgs,
};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let session = commands::session::Options::parse(matches)?;
    let globals = GlobalArgs::new(session.api_url)
        .with_state_dir(session.state_dir)
        .with_expiry(session.expiry);

    let (name, sub_m) = matches.subcommand().context("missing subcommand")?;

    let action = match name {
        "login" => Action::Login(account::Args {
            globals,
            credentials: Credentials::parse(sub_m)?,
        }),
        "register" => Action::Register(account::Args {
            globals,
            credentials: Credentials::parse(sub_m)?,
        }),
        "logout" => Action::Logout(globals),
        "whoami" => Action::Whoami(globals),
        "check" => Action::Check(check::Args {
            globals,
            page: sub_m
                .get_one::<String>(commands::account::ARG_PAGE)
                .cloned()
                .context("missing required argument: <page>")?,
        }),
        "hints" => Action::Hints(hints::Args {
            globals,
            options: commands::hints::Options::parse(sub_m),
        }),
        other => anyhow::bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}
