//! Application Startup
//!
//! Application building and server initialization.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::application::services::{
    ArticleService, BacklogSweeper, CommunityService, DiscussionService, GroupCascade, SearchSync,
    VoteService,
};
use crate::config::{SearchSettings, Settings, StoreBackend};
use crate::domain::search::SearchMirror;
use crate::infrastructure::search::{HttpMirrorConfig, HttpSearchMirror, NoopSearchMirror};
use crate::infrastructure::{database, Repositories};
use crate::presentation::http::{handlers, routes};
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub sync: Arc<SearchSync>,
    pub articles: Arc<ArticleService>,
    pub community: Arc<CommunityService>,
    pub votes: Arc<VoteService>,
    pub discussions: Arc<DiscussionService>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire every service over one store and one mirror.
    pub fn new(settings: Settings, repos: Repositories, mirror: Arc<dyn SearchMirror>) -> Self {
        let snowflake = Arc::new(SnowflakeGenerator::with_epoch(
            settings.snowflake.machine_id,
            settings.snowflake.node_id,
            settings.snowflake.epoch,
        ));

        let sync = Arc::new(SearchSync::new(
            repos.articles.clone(),
            repos.groups.clone(),
            repos.posts.clone(),
            repos.comments.clone(),
            mirror,
        ));
        let cascade = Arc::new(GroupCascade::new(
            repos.groups.clone(),
            repos.posts.clone(),
            repos.comments.clone(),
            repos.votes.clone(),
            repos.discussions.clone(),
            sync.clone(),
        ));

        Self {
            articles: Arc::new(ArticleService::new(
                repos.articles.clone(),
                sync.clone(),
                snowflake.clone(),
            )),
            community: Arc::new(CommunityService::new(
                repos.groups.clone(),
                repos.posts.clone(),
                repos.comments.clone(),
                repos.discussions.clone(),
                sync.clone(),
                cascade,
                snowflake.clone(),
            )),
            votes: Arc::new(VoteService::new(
                repos.votes.clone(),
                repos.posts.clone(),
                repos.comments.clone(),
                snowflake.clone(),
            )),
            discussions: Arc::new(DiscussionService::new(
                repos.discussions.clone(),
                snowflake.clone(),
            )),
            repos,
            sync,
            snowflake,
            settings: Arc::new(settings),
        }
    }
}

/// Build the configured search mirror.
pub fn build_mirror(settings: &SearchSettings) -> Result<Arc<dyn SearchMirror>> {
    if !settings.enabled {
        tracing::warn!("Search mirror disabled, documents are marked indexed without a mirror");
        return Ok(Arc::new(NoopSearchMirror));
    }

    let mirror = HttpSearchMirror::new(HttpMirrorConfig {
        base_url: settings.url.clone(),
        api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
        index_prefix: settings.index_prefix.clone(),
        request_timeout: Duration::from_millis(settings.timeout_ms),
    })?;
    Ok(Arc::new(mirror))
}

/// Open the configured primary store, applying migrations when asked to.
pub async fn build_repositories(settings: &Settings) -> Result<Repositories> {
    match settings.store.backend {
        StoreBackend::Postgres => {
            let pool = database::create_pool(&settings.database).await?;
            tracing::info!("Database connection pool created");

            if settings.database.run_migrations {
                database::run_migrations(&pool).await?;
                tracing::info!("Database migrations applied");
            }
            Ok(Repositories::postgres(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on exit");
            Ok(Repositories::in_memory())
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let repos = build_repositories(&settings).await?;
        let mirror = build_mirror(&settings.search)?;
        let addr = settings.server_addr();

        let state = AppState::new(settings, repos, mirror);
        let router = routes::create_router(state.clone());

        // Bind to address
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// Run the server and the backlog sweeper until Ctrl-C
    pub async fn run_until_stopped(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweep = &self.state.settings.sweep;
        let sweeper = sweep.enabled.then(|| {
            let sweeper = BacklogSweeper::new(
                self.state.sync.clone(),
                Duration::from_secs(sweep.interval_secs),
                sweep.batch_size,
            );
            tokio::spawn(sweeper.run(shutdown_rx))
        });

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Receivers may already be gone when the sweeper is disabled.
        let _ = shutdown_tx.send(true);
        if let Some(handle) = sweeper {
            handle.await?;
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
