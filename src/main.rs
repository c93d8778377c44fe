use std::{path::PathBuf, process::ExitCode, sync::Arc};

use chrono::{DateTime, NaiveDate};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use serde_json::Value;

use quiz_client::{
    app_state::AppState,
    auth::{decode_expiry, NavigationDecision},
    config::ClientConfig,
    errors::ClientResult,
    models::dto::{LoginRequest, RegisterRequest},
    services::navigation::HistoryNavigator,
    store::FileStore,
};

#[derive(Parser)]
#[command(name = "quiz-client", about = "Sign in to the quiz backend and call its API")]
struct Cli {
    /// Base URL of the backend API
    #[arg(long, env = "QUIZ_API_URL")]
    api_url: Option<String>,

    /// File the session is kept in between runs
    #[arg(long, env = "QUIZ_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in as a learner (--email) or an administrator (--username)
    Login {
        #[arg(long, required_unless_present = "username", conflicts_with = "username")]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long, env = "QUIZ_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a learner account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "QUIZ_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        qualification: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date_of_birth: NaiveDate,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// Ask the backend whether the stored token is still accepted
    Validate,
    /// Show where the router guard would send a navigation to PATH
    Navigate { path: String },
    /// Authenticated GET of an API path, printed as JSON
    Get { path: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{} ({})", e, e.error_code());
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }

    let store = Arc::new(FileStore::open(&config.session_file)?);
    let navigator = Arc::new(HistoryNavigator::new());
    let app = AppState::new(config, store, navigator.clone())?;
    app.auth_state.init_auth();

    match cli.command {
        Command::Login {
            email,
            username,
            password,
        } => {
            let credentials = match (username, email) {
                (Some(username), _) => LoginRequest::admin(&username, &password),
                (None, email) => LoginRequest::user(email.as_deref().unwrap_or_default(), &password),
            };
            app.auth_state.login(&credentials).await?;
            let snapshot = app.auth_state.snapshot();
            println!(
                "Logged in as {}",
                snapshot.role.map(|r| r.to_string()).unwrap_or_default()
            );
        }
        Command::Register {
            email,
            password,
            full_name,
            qualification,
            date_of_birth,
        } => {
            let request = RegisterRequest {
                email,
                password: SecretString::from(password),
                full_name,
                qualification,
                date_of_birth,
            };
            let body = app.auth_state.register(&request).await?;
            print_json(&body)?;
        }
        Command::Logout => {
            app.auth_state.logout();
            println!("Logged out");
        }
        Command::Whoami => {
            let snapshot = app.auth_state.snapshot();
            if !snapshot.is_authenticated {
                println!("Not logged in");
                return Ok(());
            }
            println!("role: {}", snapshot.role.map(|r| r.to_string()).unwrap_or_default());
            if let Some(user) = &snapshot.user {
                println!("user: {}", serde_json::to_string(user)?);
            }
            if let Some(login_time) = app.auth_service.login_time() {
                println!("logged in at: {}", login_time.to_rfc3339());
            }
            let expiry = app
                .auth_service
                .get_token()
                .and_then(|t| decode_expiry(&t))
                .and_then(|exp| DateTime::from_timestamp(exp, 0));
            if let Some(expiry) = expiry {
                println!("token expires at: {}", expiry.to_rfc3339());
            }
        }
        Command::Validate => {
            let valid = app.auth_service.validate_token_with_server().await;
            println!("{}", if valid { "valid" } else { "invalid" });
        }
        Command::Navigate { path } => match app.guard.check(&path) {
            NavigationDecision::Allow => println!("{}", path),
            NavigationDecision::Redirect(to) => println!("{} -> {}", path, to),
        },
        Command::Get { path } => {
            let result = app.api.get::<Value>(&path).await;
            if let Some(redirect) = navigator.current() {
                println!("redirected to {}", redirect);
            }
            print_json(&result?)?;
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> ClientResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
