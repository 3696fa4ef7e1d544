pub mod account;
pub mod check;
pub mod hints;

// Internal "interpreter" for `Action`.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Login(account::Args),
    Register(account::Args),
    Logout(GlobalArgs),
    Whoami(GlobalArgs),
    Check(check::Args),
    Hints(hints::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
