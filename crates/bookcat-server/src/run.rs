use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use bookcat_app::state::{AppConfig, AppState};
use futures::FutureExt;
use tower::Layer as _;
use tower_http::{normalize_path::NormalizePathLayer, trace::TraceLayer};
use tracing::{debug, info};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state).layer(TraceLayer::new_for_http());

    if args.cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    // trailing slash must be trimmed before routing happens
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Listening on {}, base URL {}",
        listener.local_addr()?,
        args.base_url
    );

    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(feature = "openapi")]
fn api_docs() -> utoipa::openapi::OpenApi {
    #[derive(utoipa::OpenApi)]
    #[openapi(info(title = "Book catalog API"))]
    struct OpenApi;

    use utoipa::OpenApi as _;
    OpenApi::openapi()
        .nest("/api/authors", bookcat_app::rest_api::author::api_docs())
        .nest("/api/books", bookcat_app::rest_api::book::api_docs())
}

pub fn main_router(state: AppState) -> Router<()> {
    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/api/authors", bookcat_app::rest_api::author::router())
        .nest("/api/books", bookcat_app::rest_api::book::router())
        .with_state(state)
        .route("/health", get(health));

    #[cfg(feature = "openapi")]
    {
        let docs = api_docs();
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs),
        );
    }
    router
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.data_dir();
    if !data_dir.is_dir() {
        tokio::fs::create_dir_all(&data_dir).await?;
        info!("Created data directory {}", data_dir.display());
    }

    let app_config: AppConfig = config.into();
    debug!(?app_config, "Application configuration");

    let pool = bookcat_dal::new_pool(&config.database_url()).await?;
    bookcat_dal::migrate(&pool).await?;
    info!("Database ready");

    Ok(AppState::new(app_config, pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::ServiceExt as _;

    #[tokio::test]
    async fn test_health_and_trailing_slash() {
        let pool = bookcat_dal::new_pool("sqlite::memory:").await.unwrap();
        let state = AppState::new(AppConfig::default(), pool);
        let app = NormalizePathLayer::trim_trailing_slash().layer(main_router(state));

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }
}
