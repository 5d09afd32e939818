use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use condo_api::{build_router, AppState};
use condo_core::cache::DecisionCache;
use condo_core::repositories::{AccessStore, InMemoryAccessStore};
use condo_core::{Module, ModulePermission, ModuleType, UserAccount};
use condo_infrastructure::{create_pool, run_migrations, PgAccessStore};
use condo_security::JwtService;
use condo_shared::config::{AppConfig, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    condo_shared::telemetry::init_telemetry();

    info!("Condo access server starting...");

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match config.access.storage {
        StorageBackend::Memory => {
            warn!("Using in-memory grant storage; grants are lost on restart");
            let store = Arc::new(InMemoryAccessStore::new());
            seed_memory_store(&store, &config)?;
            serve(config, store).await
        }
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let pool = create_pool(&config.database).await?;
            run_migrations(&pool).await?;
            info!("Database connection established, migrations applied.");
            serve(config, Arc::new(PgAccessStore::new(pool))).await
        }
    }
}

/// Makes a fresh in-memory deployment administrable: the access-management
/// module and, when configured, a super-admin account.
fn seed_memory_store(store: &InMemoryAccessStore, config: &AppConfig) -> anyhow::Result<()> {
    let (module, action) = condo_api::routes::MANAGE_ACCESS_PERMISSION
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("malformed management permission key"))?;

    let module = store.insert_module(Module::new(
        module.to_string(),
        "Gestion de accesos".to_string(),
        Some("Administracion de permisos y pools".to_string()),
        ModuleType::Specialized,
        None,
    )?);
    store.insert_module_permission(ModulePermission::new(
        module.id,
        action.to_string(),
        "Gestionar accesos".to_string(),
        None,
        None,
    )?);

    if let Some(email) = &config.access.super_admin_email {
        if store.find_user_by_email(email).is_none() {
            let admin = store.insert_user(UserAccount::new_super_admin(
                email.clone(),
                "Super Admin".to_string(),
            )?);
            info!("Seeded super-admin {} ({})", admin.email, admin.id);
        }
    }
    Ok(())
}

async fn serve<S: AccessStore>(config: AppConfig, store: Arc<S>) -> anyhow::Result<()> {
    let cache = Arc::new(DecisionCache::new(config.access.cache_ttl()));
    let jwt = Arc::new(JwtService::new(
        config.jwt.secret.clone(),
        config.jwt.access_token_expiry,
    ));

    let sweeper = config.access.sweep_interval().map(|every| {
        let cache = cache.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!("Decision cache sweep removed {} entries", purged);
                }
            }
        })
    });

    let state = AppState::new(store, cache, jwt);
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin("http://localhost:5173".parse::<HeaderValue>()?)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        );

    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("Condo access server stopped");
    Ok(())
}
