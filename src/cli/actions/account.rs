use crate::{
    auth::AuthFlow,
    cli::{commands::account::Credentials, globals::GlobalArgs},
};
use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub credentials: Credentials,
}

/// Log in and print the landing page for the session's role.
/// # Errors
/// Returns an error if the API rejects the login or the credential cannot be stored.
pub async fn login(args: Args) -> Result<()> {
    let flow = AuthFlow::new(args.globals.api()?, args.globals.store());
    let landing = flow
        .login(&args.credentials.email, &args.credentials.password)
        .await
        .context("login failed")?;
    println!("{}", landing.path);
    Ok(())
}

/// Register a student account and print its landing page.
/// # Errors
/// Returns an error if the API rejects the registration or the credential cannot be stored.
pub async fn register(args: Args) -> Result<()> {
    let flow = AuthFlow::new(args.globals.api()?, args.globals.store());
    let landing = flow
        .register(&args.credentials.email, &args.credentials.password)
        .await
        .context("registration failed")?;
    println!("{}", landing.path);
    Ok(())
}

/// # Errors
/// Returns an error if the stored credential cannot be removed.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let flow = AuthFlow::new(globals.api()?, globals.store());
    flow.logout().context("logout failed")?;
    Ok(())
}

pub fn whoami(globals: &GlobalArgs) {
    let session = globals.reader(globals.store()).session();
    println!("role: {}", session.role);
    if let Some(email) = session.email {
        println!("email: {email}");
    }
}
