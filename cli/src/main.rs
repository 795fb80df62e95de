use clap::Parser;
use std::sync::Arc;
use taskboard_cli::board::{Board, Toasts};
use taskboard_cli::commands::board::{self as handlers, ViewState};
use taskboard_cli::commands::{cli, shell};
use taskboard_core::api::{AppContext, CliError, CollectionError, DateFilter, LoggingConfig};
use taskboard_plugins::services::PluginServicesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            if !already_reported(&e) {
                eprintln!("{e}");
            }
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = taskboard_core::api::load_from(args.config.as_deref())
        .map_err(|e| CliError::Config(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let view = ViewState {
        filter: DateFilter::default(),
        order: cfg.view.default_order,
    };
    let ctx = AppContext::new(cfg, Some(Arc::new(PluginServicesFactory)));
    let mut toasts = Toasts::new(&ctx);

    let board = match Board::open(&ctx, args.email.clone()).await {
        Ok(board) => board,
        Err(e) => {
            toasts.drain();
            return Err(e);
        }
    };
    toasts.drain();

    let result = dispatch(args, &board, view, &mut toasts).await;
    toasts.drain();
    let closed = board.close().await;
    toasts.drain();

    result?;
    closed?;
    Ok(0)
}

/// Backend failures reach stderr as an error toast before they get here.
fn already_reported(e: &CliError) -> bool {
    matches!(e, CliError::Collection(CollectionError::Remote(_)))
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error
    // 12: sign-in rejected
    // 20: backend request / IO / command error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Auth(_) => 12,
        CliError::Collection(ce) => match ce {
            CollectionError::NotSignedIn => 12,
            CollectionError::SessionMismatch { .. } => 12,
            CollectionError::Remote(_) => 20,
            CollectionError::UnknownTask(_) => 20,
            CollectionError::Validation(_) => 20,
            CollectionError::NotReady(_) => 50,
            CollectionError::Transition(_) => 50,
            CollectionError::Superseded => 50,
        },
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(
    args: cli::Args,
    board: &Board,
    mut view: ViewState,
    toasts: &mut Toasts,
) -> Result<(), CliError> {
    match args.command {
        cli::Commands::Board(cmd) => handlers::handle(cmd, board, &view, args.format).await,
        cli::Commands::Shell => shell::run(board, &mut view, args.format, toasts).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    if !logging.console && !logging.file {
        return Err("logging enabled but neither console nor file output is on".to_string());
    }

    let file_layer = if logging.file {
        let writer = file_writer(logging)?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
    } else {
        None
    };

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
            .without_time()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Non-blocking writer for `<log_dir>/<file_prefix>.<pid>.log`. The worker
/// guard lives for the rest of the process.
fn file_writer(
    logging: &LoggingConfig,
) -> Result<tracing_appender::non_blocking::NonBlocking, String> {
    let dir = logging.log_dir();
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("create log dir {} failed: {e}", dir.display()))?;
    let appender = tracing_appender::rolling::never(&dir, logging.file_name());
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(writer)
}
