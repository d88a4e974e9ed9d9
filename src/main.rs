use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use liblink_ui::{
    ClientState, Session, build_dispatcher,
    config::{ClientConfig, Env},
    models::{
        ArchiveListQuery, ArchivePayload, BorrowQuery, FileUpload, LoginRequest, NOT_BORROWED,
        RegisterRequest, ReturnQuery,
    },
};
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line front end for the LibLink archive service.
#[derive(Parser)]
#[command(name = "liblink", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the returned token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LIBLINK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "LIBLINK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Show who the stored token belongs to
    Whoami,
    /// Navigate to a page and print where the router lands
    Navigate { path: String },
    /// Print the navigation menu
    Menu,
    /// Archive operations (requires a valid login)
    #[command(subcommand)]
    Archives(ArchiveCommand),
}

#[derive(Subcommand)]
enum ArchiveCommand {
    /// List archives
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        file_no: Option<String>,
        #[arg(long)]
        arc_type: Option<String>,
        #[arg(long)]
        borrow_state: Option<String>,
        #[arg(long)]
        folder_id: Option<u64>,
    },
    /// Add an archive
    Add(PayloadArgs),
    /// Borrow an archive
    Borrow {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        borrower: Option<String>,
    },
    /// Return a borrowed archive
    Return {
        #[arg(long)]
        id: u64,
    },
    /// Replace an archive record
    Update {
        id: u64,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Upload a batch import file
    Import { file: PathBuf },
    /// Upload a batch operation file
    Operate { file: PathBuf },
}

#[derive(Args)]
struct PayloadArgs {
    #[arg(long)]
    file_no: String,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    contract_no: String,
    #[arg(long, default_value = "")]
    inst_no: String,
    #[arg(long, default_value = "")]
    arc_type: String,
    #[arg(long, default_value = NOT_BORROWED)]
    borrow_state: String,
    #[arg(long, default_value_t = 0)]
    folder_id: u64,
}

impl From<PayloadArgs> for ArchivePayload {
    fn from(args: PayloadArgs) -> Self {
        Self {
            file_no: args.file_no,
            title: args.title,
            contract_no: args.contract_no,
            inst_no: args.inst_no,
            arc_type: args.arc_type,
            borrow_state: args.borrow_state,
            folder_id: args.folder_id,
        }
    }
}

/// parse_args
///
/// Loads `.env` first so its values can fill clap's `env` fallbacks (e.g. the password).
fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    dotenv::dotenv().ok();
    Cli::try_parse_from(args)
}

/// main
///
/// Loads configuration, installs logging, restores the stored session and runs one
/// command against the backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration
    let cli = parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());
    let config = ClientConfig::load();

    // 2. Logging, pretty locally and JSON in production.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "liblink_ui=debug,liblink=debug,reqwest=info".into());
    match config.env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    tracing::debug!(env = ?config.env, api = %config.api_base_url, "client starting");

    // 3. Session and state
    let store = config.token_store();
    let token = store.load().await?;
    let dispatcher = build_dispatcher(&config, token.as_deref())?;
    let session = Session::new(token, config.token_verifier());
    let state = ClientState::new(config, Arc::new(dispatcher))?;

    match cli.command {
        Command::Login { email, password } => {
            let response = state
                .account
                .login(&LoginRequest { email, password })
                .await
                .context("login failed")?;
            store.save(&response.token).await?;
            tracing::info!(path = %store.path().display(), "token stored");
            println!("logged in");
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let message = state
                .account
                .register(&RegisterRequest {
                    username,
                    email,
                    password,
                })
                .await
                .context("registration failed")?;
            print_json(&message)?;
        }
        Command::Logout => {
            store.clear().await?;
            println!("logged out");
        }
        Command::Whoami => match session.claims() {
            Some(claims) => println!("{}", claims.email),
            None if session.token().is_some() => bail!("stored token is expired or invalid"),
            None => bail!("not logged in: run `liblink login` first"),
        },
        Command::Navigate { path } => {
            let navigation = state.router.push(&path, &session).await?;
            match &navigation.redirected_from {
                Some(from) => println!("{from} -> {} ({})", navigation.path, navigation.name),
                None => println!("{} ({})", navigation.path, navigation.name),
            }
            println!("view: {}", navigation.view.module);
        }
        Command::Menu => {
            for (route, meta) in state.router.menu() {
                println!("{:<8} {:<10} {} [{}]", route.path, route.name, meta.title, meta.icon);
            }
        }
        Command::Archives(command) => {
            // Archive work happens on the borrow page, so it goes through the guard first.
            let navigation = state.router.push("/borrow", &session).await?;
            if navigation.redirected_from.is_some() {
                bail!("not logged in: run `liblink login` first");
            }
            run_archive_command(&state, command).await?;
        }
    }

    Ok(())
}

async fn run_archive_command(state: &ClientState, command: ArchiveCommand) -> anyhow::Result<()> {
    let api = &state.archives;
    match command {
        ArchiveCommand::List {
            page,
            page_size,
            title,
            file_no,
            arc_type,
            borrow_state,
            folder_id,
        } => {
            let query = ArchiveListQuery {
                page,
                page_size,
                title,
                file_no,
                arc_type,
                borrow_state,
                folder_id,
            };
            print_json(&api.get_archives(&query).await?)
        }
        ArchiveCommand::Add(payload) => print_json(&api.add_archive(&payload.into()).await?),
        ArchiveCommand::Borrow { id, borrower } => {
            print_json(&api.borrow_archive(&BorrowQuery { id, borrower }).await?)
        }
        ArchiveCommand::Return { id } => {
            print_json(&api.return_archive(&ReturnQuery { id }).await?)
        }
        ArchiveCommand::Update { id, payload } => {
            print_json(&api.update_archive(id, &payload.into()).await?)
        }
        ArchiveCommand::Import { file } => {
            let upload = FileUpload::from_path(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            print_json(&api.batch_import_archives(upload).await?)
        }
        ArchiveCommand::Operate { file } => {
            let upload = FileUpload::from_path(&file)
                .await
                .with_context(|| format!("cannot read {}", file.display()))?;
            print_json(&api.batch_operate_archives(upload).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
