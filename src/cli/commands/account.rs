use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_PAGE: &str = "page";

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// Parse email and password from a `login`/`register` subcommand.
    ///
    /// # Errors
    /// Returns an error if either argument is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            email: read_required(ARG_EMAIL)?,
            password: SecretString::from(read_required(ARG_PASSWORD)?),
        })
    }
}

fn with_credentials(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_EMAIL)
                .short('e')
                .long(ARG_EMAIL)
                .help("Account email")
                .env("EDURAG_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .short('p')
                .long(ARG_PASSWORD)
                .help("Account password")
                .env("EDURAG_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

#[must_use]
pub fn subcommands() -> Vec<Command> {
    vec![
        with_credentials(
            Command::new("login").about("Log in and store the credential for this API"),
        ),
        with_credentials(
            Command::new("register").about("Create a student account and log in"),
        ),
        Command::new("logout").about("Forget the stored credential"),
        Command::new("whoami").about("Show the role and email of the current session"),
        Command::new("check")
            .about("Check whether the current session may open a page")
            .arg(
                Arg::new(ARG_PAGE)
                    .help("App path, for example /tutor/monitor")
                    .required(true),
            ),
    ]
}
