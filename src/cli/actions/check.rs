use crate::{cli::globals::GlobalArgs, session::Decision};
use anyhow::{bail, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub page: String,
}

/// Print `allow <role>` or `redirect <target>` for a page.
/// # Errors
/// Returns an error when the page redirects, so the exit status reflects the decision.
pub fn execute(args: &Args) -> Result<()> {
    match args.globals.guard().check_page(&args.page) {
        Decision::Allow(access) => {
            println!("allow {}", access.role());
            Ok(())
        }
        Decision::Redirect(target) => {
            println!("redirect {target}");
            bail!("{} is not available to the current session", args.page)
        }
    }
}
