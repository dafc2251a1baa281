use std::{process, sync::Arc, time::Duration};

use todo_api::{
    application::{error::AppError, repos::TodosRepo, todos::TodoService},
    cache::{self, CacheFacade},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::{net::TcpListener, signal, sync::oneshot};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let store = cache::build_store(&settings.cache)
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let todos_repo: Arc<dyn TodosRepo> = repositories.clone();
    let todos = Arc::new(TodoService::new(
        CacheFacade::new(store.clone()),
        todos_repo,
    ));

    let state = ApiState {
        todos,
        db: repositories,
        cache: store,
    };

    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target = "todo_api::migrate", "Migrations applied");
    Ok(())
}

async fn connect_pool(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = connect_pool(settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "todo_api::server",
        addr = %settings.server.addr,
        "Listening"
    );

    let (drained_tx, drained_rx) = oneshot::channel::<()>();
    let grace = settings.server.graceful_shutdown;

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace, drained_rx));

    let result = server
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")));
    let _ = drained_tx.send(());

    info!(target = "todo_api::server", "Server stopped");
    result
}

/// Resolves on SIGINT/SIGTERM and arms a watchdog that exits the process if in-flight
/// requests have not drained within `grace`.
async fn shutdown_signal(grace: Duration, drained: oneshot::Receiver<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        target = "todo_api::server",
        grace_seconds = grace.as_secs(),
        "Shutdown requested, draining connections"
    );

    tokio::spawn(async move {
        if tokio::time::timeout(grace, drained).await.is_err() {
            warn!(target = "todo_api::server", "Graceful shutdown timed out");
            process::exit(1);
        }
    });
}
