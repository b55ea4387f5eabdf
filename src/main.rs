//! `launchpad` command-line front end.
//!
//! Each invocation is one application start: the controller restores the
//! session from the file store and validates it before the command runs.
//! `shell` keeps one controller and navigator alive across many commands.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use launchpad::config::{AppConfig, ConfigError};
use launchpad::net::api::{ApiClient, ApiError};
use launchpad::net::types::NewPost;
use launchpad::pages::{self, forgot_password, signin, signup};
use launchpad::routes::guard::{NavState, SIGN_IN_PATH};
use launchpad::routes::{Navigation, Navigator};
use launchpad::services::auth::{AuthError, DemoBackend};
use launchpad::state::auth::{AuthController, AuthStatus};
use launchpad::store::session::FileStore;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Form(&'static str),
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<signup::SignUpError> for CliError {
    fn from(err: signup::SignUpError) -> Self {
        match err {
            signup::SignUpError::Form(message) => Self::Form(message),
            signup::SignUpError::Auth(e) => Self::Auth(e),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "launchpad", about = "Launchpad dashboard session CLI")]
struct Cli {
    /// Session store file.
    #[arg(long, env = "LAUNCHPAD_STORAGE_PATH")]
    storage: Option<std::path::PathBuf>,

    /// REST backend base URL.
    #[arg(long, env = "LAUNCHPAD_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current auth status and user.
    Status,
    Login(LoginArgs),
    Signup(SignupArgs),
    Logout,
    /// Navigate to a path and render what the guard allows.
    Visit {
        path: String,
    },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    Api(ApiCommand),
    /// Interactive session reading commands from stdin.
    Shell,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Protected path to resume after signing in.
    #[arg(long)]
    from: Option<String>,
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long, default_value_t = false)]
    accept_terms: bool,
}

#[derive(Args, Debug)]
struct ApiCommand {
    #[command(subcommand)]
    command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApiSubcommand {
    Posts {
        #[arg(long)]
        user: Option<u64>,
    },
    Post {
        id: u64,
    },
    Comments {
        post_id: u64,
    },
    Albums {
        #[arg(long)]
        user: Option<u64>,
    },
    Album {
        id: u64,
    },
    CreatePost {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        user_id: u64,
    },
}

/// One line of `shell` input, parsed with the same subcommands.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

struct App {
    config: AppConfig,
    auth: AuthController,
    nav: Navigator,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }
    if let Some(api_url) = cli.api_url {
        config.set_api_url(&api_url)?;
    }

    let mut app = start(config).await;
    match cli.command {
        Command::Shell => run_shell(&mut app).await,
        command => run_command(&mut app, command).await,
    }
}

async fn start(config: AppConfig) -> App {
    tracing::debug!(path = %config.storage_path.display(), "opening session store");
    let store = Arc::new(FileStore::new(config.storage_path.clone()));
    let backend = Arc::new(DemoBackend::new(config.demo.clone(), config.latency));
    let auth = AuthController::new(store, backend);
    let status = auth.validate().await;
    tracing::debug!(?status, "startup validation settled");
    let nav = Navigator::new(auth.clone());
    App { config, auth, nav }
}

async fn run_command(app: &mut App, command: Command) -> Result<(), CliError> {
    match command {
        Command::Status => {
            print_status(&app.auth);
            Ok(())
        }
        Command::Login(args) => run_login(app, args).await,
        Command::Signup(args) => {
            let form = signup::SignUpForm {
                name: args.name,
                email: args.email,
                password: args.password,
                confirm_password: args.confirm_password,
                accept_terms: args.accept_terms,
            };
            match signup::submit(&app.auth, &mut app.nav, &form).await {
                Ok(navigation) => {
                    print_view(app, &navigation);
                    Ok(())
                }
                Err(err) => {
                    println!("{}", signup::render(Some(&err)));
                    Err(err.into())
                }
            }
        }
        Command::Logout => {
            app.auth.logout();
            let navigation = app.nav.navigate(SIGN_IN_PATH);
            print_view(app, &navigation);
            Ok(())
        }
        Command::Visit { path } => {
            let navigation = app.nav.navigate(&path);
            print_view(app, &navigation);
            Ok(())
        }
        Command::ForgotPassword { email } => {
            let email = forgot_password::validate_reset_input(&email).map_err(CliError::Form)?;
            println!("{}", forgot_password::request_reset(&email, app.config.reset_delay).await);
            Ok(())
        }
        Command::Api(api) => run_api(app, api).await,
        Command::Shell => Err(CliError::Form("already in a shell")),
    }
}

async fn run_login(app: &mut App, args: LoginArgs) -> Result<(), CliError> {
    if let Some(from) = args.from {
        app.nav.navigate_with(SIGN_IN_PATH, NavState::from_path(from));
    }
    let (email, password) = signin::validate_sign_in_input(&args.email, &args.password).map_err(CliError::Form)?;
    match signin::submit(&app.auth, &mut app.nav, &email, &password).await {
        Ok(navigation) => {
            print_view(app, &navigation);
            Ok(())
        }
        Err(err) => {
            println!("{}", signin::render(Some(&err), app.nav.state(), &app.config.demo));
            Err(err.into())
        }
    }
}

async fn run_api(app: &App, api: ApiCommand) -> Result<(), CliError> {
    let client = ApiClient::new(&app.config.api_url).with_token(app.auth.token());
    match api.command {
        ApiSubcommand::Posts { user: Some(user) } => print_json(&client.posts_by_user(user).await?),
        ApiSubcommand::Posts { user: None } => print_json(&client.posts().await?),
        ApiSubcommand::Post { id } => print_json(&client.post(id).await?),
        ApiSubcommand::Comments { post_id } => print_json(&client.post_comments(post_id).await?),
        ApiSubcommand::Albums { user: Some(user) } => print_json(&client.albums_by_user(user).await?),
        ApiSubcommand::Albums { user: None } => print_json(&client.albums().await?),
        ApiSubcommand::Album { id } => print_json(&client.album(id).await?),
        ApiSubcommand::CreatePost { title, body, user_id } => {
            print_json(&client.create_post(&NewPost { user_id, title, body }).await?)
        }
    }
}

async fn run_shell(app: &mut App) -> Result<(), CliError> {
    print_status(&app.auth);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["exit" | "quit"] => break,
            _ => {}
        }
        match ShellLine::try_parse_from(words) {
            Ok(parsed) => {
                if let Err(e) = run_command(app, parsed.command).await {
                    eprintln!("error: {e}");
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }
    Ok(())
}

fn print_status(auth: &AuthController) {
    match (auth.status(), auth.current_user()) {
        (AuthStatus::Authenticated, Some(user)) => {
            println!("authenticated as {} <{}> ({})", user.name, user.email, user.role);
        }
        (AuthStatus::Checking, _) => println!("checking"),
        _ => println!("unauthenticated"),
    }
}

fn print_view(app: &App, navigation: &Navigation) {
    println!("[{}]", navigation.location);
    println!("{}", pages::render(navigation, app.nav.state(), &app.auth, &app.config.demo));
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
