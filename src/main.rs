//! Entry point: load config, wire the session, and run one command.

use bill_client::config::Config;
use bill_client::models::{NewUser, UserRecord};
use bill_client::{create_session, SessionService};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bill_client", about = "Sign in to the bill management API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the token.
    Login {
        username: String,
        #[arg(long, env = "BILL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Does not sign in.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BILL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the remembered token.
    Logout,
    /// Show the signed-in user.
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let session = create_session(&config)?;

    match cli.command {
        Command::Login { username, password } => {
            session
                .login(&username, &password)
                .await
                .into_result()
                .map_err(anyhow::Error::msg)?;
            println!("logged in as {username}");
            if let Some(user) = profile(&session, config.request_timeout).await {
                println!("{}", serde_json::to_string_pretty(&user)?);
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let record = NewUser {
                username: username.clone(),
                email,
                password,
            };
            session
                .register(&record)
                .await
                .into_result()
                .map_err(anyhow::Error::msg)?;
            println!("registered {username}; run `login` to sign in");
        }
        Command::Logout => {
            session.logout();
            println!("logged out");
        }
        Command::Whoami => {
            if !session.is_authenticated() {
                println!("not logged in");
                return Ok(());
            }
            match profile(&session, config.request_timeout).await {
                Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                None => println!("logged in; profile unavailable"),
            }
        }
    }
    Ok(())
}

/// Wait for the background profile fetch started by login or bootstrap.
async fn profile(session: &SessionService, timeout: Duration) -> Option<UserRecord> {
    tokio::time::timeout(timeout, session.wait_for_user()).await.ok()
}
