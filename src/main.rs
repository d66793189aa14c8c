use kobonz::kv::{CacheStore, CounterStore, KvStore, MemoryKv, RateLimiter, RedisKv};
use kobonz::{api, config::Config, db::init_db, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

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
    let repo = Arc::new(Repository::new(pool));

    // The key-value store is an optimization layer; an unreachable Redis
    // degrades to a per-process in-memory store instead of refusing to
    // start.
    let kv: Arc<dyn KvStore> = match RedisKv::connect(&config.redis_url).await {
        Ok(redis) => Arc::new(redis),
        Err(e) => {
            tracing::warn!(
                "Redis unavailable ({}), falling back to in-memory store",
                e
            );
            Arc::new(MemoryKv::new())
        }
    };

    let cache = CacheStore::new(kv.clone()).with_default_ttl(config.cache_ttl_secs);
    let counters = CounterStore::new(kv.clone());
    let rate_limiter = RateLimiter::new(kv);

    // Create router
    let state = api::AppState::new(repo, cache, counters, rate_limiter, config);
    let app = api::create_router(state);

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
