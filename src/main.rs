use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use bravespace::{
    application::{
        admin::{AdminFounderService, AdminGalleryService, AdminPostService, AdminTagService},
        auth::{AdminAuthService, AdminCredentials},
        error::AppError,
        feed::FeedService,
        repos::{
            FoundersRepo, GalleryRepo, PostTagsRepo, PostsRepo, PostsWriteRepo, TagsRepo,
            TagsWriteRepo,
        },
        storage::BlobStore,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HealthCheck, HttpState},
        telemetry,
        uploads::FsBlobStore,
    },
};
use tokio::sync::watch;
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

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    info!(
        target = "bravespace::migrate",
        "database migrations are up to date"
    );
    repositories.pool().close().await;
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = Arc::new(init_repositories(&settings).await?);
    let blobs = FsBlobStore::new(
        settings.uploads.directory.clone(),
        &settings.uploads.public_base_url,
    )
    .map_err(|err| InfraError::storage(settings.uploads.directory.clone(), err))?;

    let state = build_http_state(repositories, Arc::new(blobs), &settings);
    serve_http(&settings, state).await
}

async fn init_repositories(settings: &config::Settings) -> Result<PostgresRepositories, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(PostgresRepositories::new(pool))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    blobs: Arc<FsBlobStore>,
    settings: &config::Settings,
) -> HttpState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let post_tags_repo: Arc<dyn PostTagsRepo> = repositories.clone();
    let tags_repo: Arc<dyn TagsRepo> = repositories.clone();
    let tags_write_repo: Arc<dyn TagsWriteRepo> = repositories.clone();
    let founders_repo: Arc<dyn FoundersRepo> = repositories.clone();
    let gallery_repo: Arc<dyn GalleryRepo> = repositories.clone();
    let health: Arc<dyn HealthCheck> = repositories;
    let blob_store: Arc<dyn BlobStore> = blobs;
    let max_image_bytes = settings.uploads.max_image_bytes.get();

    let feed = FeedService::new(
        posts_repo.clone(),
        post_tags_repo.clone(),
        tags_repo.clone(),
        founders_repo.clone(),
        gallery_repo.clone(),
    );
    let posts = AdminPostService::new(
        posts_repo,
        posts_write_repo,
        post_tags_repo,
        blob_store.clone(),
        max_image_bytes,
    );
    let tags = AdminTagService::new(tags_repo, tags_write_repo);
    let founders = AdminFounderService::new(founders_repo, blob_store.clone(), max_image_bytes);
    let gallery = AdminGalleryService::new(gallery_repo, blob_store.clone(), max_image_bytes);

    let credentials = match (&settings.admin.username, &settings.admin.password) {
        (Some(username), Some(password)) => Some(AdminCredentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => {
            warn!(
                target = "bravespace::serve",
                "admin credentials are not configured; admin sign-in is disabled"
            );
            None
        }
    };
    let auth = AdminAuthService::new(credentials, settings.admin.session_ttl);

    HttpState {
        feed: Arc::new(feed),
        posts: Arc::new(posts),
        tags: Arc::new(tags),
        founders: Arc::new(founders),
        gallery: Arc::new(gallery),
        auth: Arc::new(auth),
        blobs: blob_store,
        health,
        max_request_bytes: usize::try_from(settings.uploads.max_request_bytes.get())
            .unwrap_or(usize::MAX),
    }
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "bravespace::serve",
        addr = %settings.server.addr,
        "http server listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut graceful_rx = shutdown_rx.clone();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            let _ = graceful_rx.wait_for(|stopping| *stopping).await;
            info!(target = "bravespace::serve", "shutdown requested");
        },
    );

    let grace = settings.server.graceful_shutdown;
    let mut deadline_rx = shutdown_rx;
    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(&mut deadline_rx, grace) => {
            warn!(
                target = "bravespace::serve",
                grace_seconds = grace.as_secs(),
                "in-flight requests did not finish before the shutdown deadline"
            );
        }
    }

    Ok(())
}

async fn drain_deadline(shutdown: &mut watch::Receiver<bool>, grace: Duration) {
    if shutdown.wait_for(|stopping| *stopping).await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "bravespace::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "bravespace::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
