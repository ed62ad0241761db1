use std::net::SocketAddr;
use std::sync::Arc;
use tradepost::catalog::{CachedCatalog, CatalogSource, SqliteCatalog};
use tradepost::domain::SystemClock;
use tradepost::engine::SideEffects;
use tradepost::{api, config::Config, db::init_db, sweeper, Repository, TradeEngine, TradeEvents};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let clock = Arc::new(SystemClock);
    let repo = Arc::new(Repository::new(pool.clone()));
    let catalog: Arc<dyn CatalogSource> = Arc::new(CachedCatalog::new(
        SqliteCatalog::new(pool),
        clock.clone(),
        config.catalog_cache_ttl_ms,
    ));
    let events = Arc::new(TradeEvents::new());
    let effects = SideEffects::new(repo.clone(), clock.clone());
    let engine = Arc::new(TradeEngine::new(
        repo,
        catalog,
        events.clone(),
        effects,
        clock,
        config.trade_ttl_ms,
    ));

    let _sweeper = sweeper::spawn_sweeper(engine.clone(), config.sweep_interval_ms);

    // Create router
    let app = api::create_router(api::AppState { engine, events });

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
