use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use axum::Router;
use guesty_source::{
    api,
    app_state::{AppState, Status},
    client::{ClientSettings, GuestyClient},
    config::AppConfig,
    images::HttpFileFactory,
    report::CollectingReporter,
    schema,
    store::MemoryNodeStore,
    validate,
};
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    info!("Fuente Guesty cargada");

    // 2. Cargar configuración
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;

    // 3. Validar opciones (forma + comprobación en vivo)
    let validation = validate::validate_options(&cfg.plugin_options(), &cfg.endpoint).await;
    let Some(options) = validation.options.filter(|_| validation.errors.is_empty()) else {
        for err in &validation.errors {
            error!("Opción inválida: {err}");
        }
        bail!("Configuración de Guesty inválida ({} errores)", validation.errors.len());
    };

    // 4. Cliente, descargador de imágenes y almacén
    let client = GuestyClient::new(&ClientSettings {
        endpoint: cfg.endpoint.clone(),
        credentials: options.credentials(),
    })?;
    let files = HttpFileFactory::new(cfg.cache_dir.clone(), cfg.endpoint.timeout)?;
    let store = MemoryNodeStore::new();
    schema::declare(&store, cfg.image_mode);

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 5. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        client: Arc::new(client),
        files: Arc::new(files),
        store: Arc::new(store),
        reporter: Arc::new(CollectingReporter::new()),
        status: Arc::new(Mutex::new(Status {
            is_busy: false,
            message: "Servidor listo.".to_string(),
            last_summary: None,
        })),
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    // 6. Primera pasada completa
    api::run_source_pass(&app_state).await;

    // 7. Configurar el router de la API
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 8. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    info!("🚀 Servidor de inspección escuchando en http://{server_addr}");

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
