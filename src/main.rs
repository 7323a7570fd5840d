use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use watchnext_api::{
    api::{create_router, AppDependencies, AppState},
    config::Config,
    db::{
        create_pool, create_redis_client, CatalogStore, InMemoryStore, NotificationStore, PgStore,
        RedisJobLock,
    },
    services::{
        JobLock, LocalJobLock, MetadataProvider, ReconciliationScheduler, SystemClock,
        TmdbProvider, WeeklySchedule,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (catalog_store, notification_store): (Arc<dyn CatalogStore>, Arc<dyn NotificationStore>) =
        match config.database_url() {
            Some(url) => {
                let pool = create_pool(url)
                    .await
                    .context("Failed to connect to Postgres")?;
                let store = Arc::new(PgStore::new(pool));
                store.migrate().await?;
                tracing::info!("Using Postgres catalog store");
                (store.clone(), store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, catalog is held in memory only");
                let store = Arc::new(InMemoryStore::new());
                (store.clone(), store)
            }
        };

    let job_lock: Arc<dyn JobLock> = match config.redis_url() {
        Some(url) => {
            let client = create_redis_client(url).context("Invalid REDIS_URL")?;
            tracing::info!("Using Redis reconciliation lock");
            Arc::new(RedisJobLock::new(
                client,
                Duration::from_secs(config.reconcile_lock_ttl_secs),
            ))
        }
        None => Arc::new(LocalJobLock::new()),
    };

    let provider: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::new(
        config.tmdb_api_token.clone(),
        config.tmdb_api_url.clone(),
        Duration::from_secs(config.tmdb_timeout_secs),
    )?);
    tracing::info!(provider = provider.name(), "Metadata provider configured");

    let clock = Arc::new(SystemClock);
    let state = AppState::new(AppDependencies {
        catalog_store,
        notification_store,
        provider,
        job_lock,
        clock: clock.clone(),
        reconcile_concurrency: config.reconcile_concurrency,
        notify_unstarted_series: config.notify_unstarted_series,
    });

    let scheduler = if config.scheduler_enabled {
        let schedule = WeeklySchedule::new(config.reconcile_weekday, config.reconcile_hour)?;
        tracing::info!(
            weekday = %schedule.weekday(),
            hour = config.reconcile_hour,
            "Weekly reconciliation enabled"
        );
        let scheduler = ReconciliationScheduler::new(state.runner.clone(), clock, schedule)
            .with_run_on_startup(config.reconcile_on_startup);
        Some(Arc::new(scheduler).spawn())
    } else {
        tracing::info!("Weekly reconciliation disabled");
        None
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
