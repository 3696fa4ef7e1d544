use crate::cli::actions::{account, check, hints, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => account::login(args).await,
        Action::Register(args) => account::register(args).await,
        Action::Logout(globals) => account::logout(&globals),
        Action::Whoami(globals) => {
            account::whoami(&globals);
            Ok(())
        }
        Action::Check(args) => check::execute(&args),
        Action::Hints(args) => hints::execute(args).await,
    }
}
