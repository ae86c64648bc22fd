//! Equipment Identity Register - main entry point.
//!
//! Wires the config/logging/repository/cache/audit/governance ambient
//! stack together, then starts three surfaces: the Core's own Diameter
//! endpoint (behind a loopback address, fronted by the gateway), the
//! externally-documented Diameter listener, and the actix-web HTTP
//! server carrying the 5G equivalence endpoint, the management API, and
//! health/readiness/metrics.

mod diameter;
mod http;
mod metrics;
mod openapi;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware::Logger, web, App, HttpServer};
use eir_audit::{AuditService, RetentionScheduler};
use eir_cache::CacheClient;
use eir_config::{CacheProvider, DatabaseType};
use eir_core::{CoreDecisionEngine, DefaultPolicy, EquipmentDecisionEngine};
use eir_gateway::{DiameterGateway, GatewayConfig};
use eir_governance::GovernanceHandle;
use eir_repository::{
    EquipmentRepository, EquipmentStatus, InMemoryRepository, PostgresRepository,
    RepositoryBackend, RepositoryHandle,
};
use prometheus::Registry;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::diameter::CoreDiameterConfig;
use crate::metrics::ServerMetrics;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// 3GPP's registered enterprise number, carried in CER/CEA's Vendor-Id AVP.
const DIAMETER_VENDOR_ID: u32 = 10415;
const DIAMETER_PRODUCT_NAME: &str = "eir-core";

/// Retention cutoff the S9 scenario exercises. Not a configuration key:
/// the surface list only names `server`/`database`/`diameter`/`cache`/
/// `logging`/`metrics`/`governance`, so this stays a fixed operational
/// policy rather than a new config section.
const DEFAULT_RETENTION_DAYS: i64 = 90;
const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const EQUIPMENT_GAUGE_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    eir_utils::init_logger();
    log::info!("starting equipment identity register");

    let config = match eir_config::load(&eir_config::NoopRemoteConfigSource).await {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let repository = match config.database.kind {
        DatabaseType::Postgres => {
            match PostgresRepository::connect(
                &config.database.connection_string(),
                config.database.max_open_conns,
            )
            .await
            {
                Ok(repo) => RepositoryHandle::Postgres(Arc::new(repo)),
                Err(e) => {
                    log::error!("failed to connect to database: {}", e);
                    std::process::exit(3);
                }
            }
        }
        DatabaseType::InMemory => RepositoryHandle::InMemory(Arc::new(InMemoryRepository::new())),
    };
    let backend: Arc<dyn RepositoryBackend> = repository.as_backend();
    log::info!("repository backend ready ({:?})", config.database.kind);

    let cache = match config.cache.provider {
        CacheProvider::Redis => match CacheClient::new(&config.cache.redis_addr).await {
            Ok(client) => Some(Arc::new(client) as Arc<dyn eir_cache::CacheGet>),
            Err(e) => {
                log::warn!("cache unavailable, continuing without it: {}", e);
                None
            }
        },
        CacheProvider::Memcached => {
            log::warn!("memcached cache provider is not implemented, continuing without a cache");
            None
        }
        CacheProvider::None => None,
    };

    let mut engine = CoreDecisionEngine::new(backend.clone());
    if let Some(cache) = cache {
        engine = engine.with_cache(cache, Duration::from_secs(config.cache.ttl_secs));
    }
    let engine = engine.with_default_policy(DefaultPolicy::default());
    let engine: Arc<dyn EquipmentDecisionEngine> = Arc::new(engine);

    let audit = Arc::new(AuditService::new(backend.clone()));
    RetentionScheduler::new(audit.clone(), DEFAULT_RETENTION_DAYS, RETENTION_SWEEP_INTERVAL).spawn();

    let governance = GovernanceHandle::noop(config.governance.clone());
    if let Err(e) = governance.start().await {
        log::warn!("governance registration failed: {}", e);
    }

    let registry = Registry::new();
    let metrics = Arc::new(ServerMetrics::new(&registry));

    let app_state = Arc::new(AppState {
        engine,
        backend: backend.clone(),
        audit,
        metrics: metrics.clone(),
        start_version: env!("CARGO_PKG_VERSION"),
    });

    spawn_equipment_gauge_refresh(backend, metrics);

    if config.diameter.enabled {
        if let Err(code) = start_diameter(&config, app_state.clone()).await {
            std::process::exit(code);
        }
    } else {
        log::info!("diameter surface disabled by configuration");
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let registry_data = web::Data::new(registry);
    let state_data = web::Data::new(app_state);

    let server = match HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .app_data(registry_data.clone())
            .wrap(Logger::default())
            .route("/swagger-ui", web::get().to(redirect_to_swagger))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(http::configure_routes)
    })
    .bind((host.as_str(), port))
    {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to bind HTTP listener on {}:{}: {}", host, port, e);
            std::process::exit(2);
        }
    }
    .shutdown_timeout(30);

    log::info!("HTTP surfaces listening on {}:{}", host, port);
    log::info!("  - 5G equivalence: http://{}:{}/n5g-eir-eic/v1/equipment-status", host, port);
    log::info!("  - management API: http://{}:{}/equipment", host, port);
    log::info!("  - health: http://{}:{}/health", host, port);
    log::info!("  - metrics: http://{}:{}/metrics", host, port);

    let result = server.run().await;

    if let Err(e) = governance.shutdown().await {
        log::warn!("governance deregistration failed: {}", e);
    }

    match result {
        Ok(()) => {
            log::info!("shut down cleanly");
            std::process::exit(0);
        }
        Err(e) => {
            log::error!("http server terminated with an error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Binds the Core's own Diameter endpoint on an ephemeral loopback port,
/// then the externally-documented listener fronting it, per the
/// single-external-listener topology: only `diameter.listen_addr` is ever
/// bound on a routable address, with the gateway forwarding to the Core
/// over loopback.
async fn start_diameter(
    config: &eir_config::EirConfig,
    state: Arc<AppState>,
) -> Result<(), i32> {
    let external_addr: SocketAddr = config.diameter.listen_addr.parse().map_err(|e| {
        log::error!(
            "invalid diameter.listen_addr {:?}: {}",
            config.diameter.listen_addr,
            e
        );
        1
    })?;

    let core_listener = TcpListener::bind("127.0.0.1:0").await.map_err(|e| {
        log::error!("failed to bind internal core diameter listener: {}", e);
        2
    })?;
    let core_addr = core_listener.local_addr().map_err(|e| {
        log::error!("failed to resolve internal core diameter address: {}", e);
        2
    })?;

    let gateway_listener = TcpListener::bind(external_addr).await.map_err(|e| {
        log::error!("failed to bind diameter listener on {}: {}", external_addr, e);
        2
    })?;

    let core_config = Arc::new(CoreDiameterConfig {
        origin_host: config.diameter.origin_host.clone(),
        origin_realm: config.diameter.origin_realm.clone(),
        host_ip_address: core_addr.ip().to_string(),
        vendor_id: DIAMETER_VENDOR_ID,
        product_name: DIAMETER_PRODUCT_NAME.to_string(),
        auth_application_ids: vec![eir_codec::constants::application_ids::S13],
    });

    tokio::spawn(diameter::run(core_listener, core_config, state));

    let gateway_config = GatewayConfig {
        listen_addr: external_addr,
        core_addr,
        origin_host: config.diameter.origin_host.clone(),
        origin_realm: config.diameter.origin_realm.clone(),
        host_ip_address: external_addr.ip().to_string(),
        vendor_id: DIAMETER_VENDOR_ID,
        product_name: DIAMETER_PRODUCT_NAME.to_string(),
        auth_application_ids: vec![eir_codec::constants::application_ids::S13],
    };
    let gateway = DiameterGateway::new(gateway_config);

    tokio::spawn(async move {
        if let Err(e) = gateway.run_with_listener(gateway_listener).await {
            log::error!("diameter gateway terminated: {}", e);
        }
    });

    log::info!("diameter surface listening on {} (core at {})", external_addr, core_addr);
    Ok(())
}

/// Keeps `eir_equipment_by_status` current for operators without requiring
/// a repository-level count query; cheap enough at expected provisioning
/// volumes to just list and count per status on a slow cadence.
fn spawn_equipment_gauge_refresh(backend: Arc<dyn RepositoryBackend>, metrics: Arc<ServerMetrics>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EQUIPMENT_GAUGE_REFRESH_INTERVAL);
        let statuses = [
            EquipmentStatus::Whitelisted,
            EquipmentStatus::Greylisted,
            EquipmentStatus::Blacklisted,
        ];
        loop {
            ticker.tick().await;
            for status in statuses {
                match backend.list_by_status(status).await {
                    Ok(rows) => metrics
                        .equipment_by_status
                        .with_label_values(&[&status.to_string()])
                        .set(rows.len() as f64),
                    Err(e) => log::warn!("failed to refresh {} gauge: {}", status, e),
                }
            }
        }
    });
}

async fn redirect_to_swagger() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Found()
        .append_header(("Location", "/swagger-ui/"))
        .finish()
}
