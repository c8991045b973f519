//! Terminal driver for the Imago auth flow.
//!
//! Stands in for the web UI: collects the form fields, runs the resolver,
//! and renders the single outcome message. The transient scope lives in
//! memory, so a session stored without `--remember` ends with the process,
//! the same lifetime a tab-scoped session has in the browser.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use imago_auth::{
    AccountStore, AuthApiClient, AuthConfig, FileStorage, LoginCredentials, MemoryStorage,
    ScopedStorage, SessionResolver, SessionStore, SignupForm,
};

#[derive(Parser)]
#[command(name = "imago-auth", version, about = "Sign in to the Imago image studio")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with a username or email
    Login {
        identifier: String,
        /// Keep the session across restarts
        #[arg(long)]
        remember: bool,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// Accept the terms of service
        #[arg(long = "accept-terms")]
        accepted_terms: bool,
    },
    /// Drop the stored session (tells the backend when reachable)
    Logout,
    /// Show the stored session, if any
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("imago_auth=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = AuthConfig::from_env();

    let scopes = ScopedStorage::new(
        Arc::new(FileStorage::open(config.storage_file())?),
        Arc::new(MemoryStorage::new()),
    );
    let resolver = SessionResolver::new(
        AuthApiClient::new(&config)?,
        AccountStore::new(scopes.durable()),
        SessionStore::new(scopes),
    );
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Login {
            identifier,
            remember,
        } => {
            let password = dialoguer::Password::new()
                .with_prompt("Password")
                .interact()?;
            let creds = LoginCredentials {
                identifier,
                password,
                remember_me: remember,
            };
            match resolver.login(&creds, &cancel).await {
                Ok(session) if session.is_demo => {
                    println!("Signed in offline as {} (demo mode)", session.username);
                }
                Ok(session) => println!("Signed in as {}", session.username),
                Err(err) => fail(&err),
            }
        }
        Command::Signup {
            first_name,
            last_name,
            email,
            accepted_terms,
        } => {
            let password = dialoguer::Password::new()
                .with_prompt("Password")
                .interact()?;
            let confirm_password = dialoguer::Password::new()
                .with_prompt("Confirm password")
                .interact()?;
            let form = SignupForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                accepted_terms,
            };
            match resolver.signup(&form, &cancel).await {
                Ok(receipt) if receipt.offline => println!(
                    "Account '{}' created in offline mode. Sign in to continue.",
                    receipt.username
                ),
                Ok(receipt) => println!(
                    "Account '{}' created. Sign in to continue.",
                    receipt.username
                ),
                Err(err) => fail(&err),
            }
        }
        Command::Logout => {
            resolver.logout(&cancel).await?;
            println!("Signed out");
        }
        Command::Status => match resolver.sessions().load()? {
            Some(session) if session.is_demo => {
                println!("Signed in offline as {} <{}>", session.username, session.email);
            }
            Some(session) => println!("Signed in as {} <{}>", session.username, session.email),
            None => println!("Not signed in"),
        },
    }

    Ok(())
}

/// Print the attempt's single user-facing message and exit nonzero.
fn fail(err: &imago_auth::AuthError) -> ! {
    if let Some(field) = err.field() {
        eprintln!("{err} (field: {field})");
    } else {
        eprintln!("{err}");
    }
    std::process::exit(1);
}
