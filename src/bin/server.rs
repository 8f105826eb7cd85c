use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exercise_catalog::{
    error::CatalogError, open_store, CatalogService, CatalogStats, ExerciseV1, ExerciseV2,
    MigrationOutcome, ServerConfig, V1Filter, V2Query,
};

#[derive(Clone)]
struct AppState {
    service: Arc<CatalogService>,
    v1_data_file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "exercise_catalog_server=info,exercise_catalog=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    tracing::info!("🚀 Starting Exercise Catalog Server");
    tracing::info!("📦 Database: {}", config.database_url);
    tracing::info!("🔌 Port: {}", config.port);

    let store = open_store(&config.database_url).await?;
    let state = AppState {
        service: Arc::new(CatalogService::new(store)),
        v1_data_file: config.v1_data_file.clone(),
    };

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🏋️ Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/exercises", get(list_v1_handler).post(create_v1_handler))
        .route(
            "/exercises/:id",
            get(get_v1_handler)
                .put(update_v1_handler)
                .delete(delete_v1_handler),
        )
        .route("/v2/exercises", get(list_v2_handler).post(create_v2_handler))
        .route("/v2/exercises/stats", get(stats_handler))
        .route("/v2/exercises/migrate", post(migrate_handler))
        .route(
            "/v2/exercises/:id",
            get(get_v2_handler)
                .put(update_v2_handler)
                .delete(delete_v2_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: exercise_catalog::VERSION.to_string(),
        database: state.service.store().backend_name().to_string(),
    })
}

async fn list_v1_handler(
    State(state): State<AppState>,
    Query(filter): Query<V1Filter>,
) -> Result<Json<Vec<ExerciseV1>>, AppError> {
    Ok(Json(state.service.list_v1(&filter).await?))
}

async fn get_v1_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ExerciseV1>, AppError> {
    Ok(Json(state.service.get_v1(id).await?))
}

async fn create_v1_handler(
    State(state): State<AppState>,
    Json(exercise): Json<ExerciseV1>,
) -> Result<(StatusCode, Json<ExerciseV1>), AppError> {
    let created = state.service.create_v1(exercise).await?;
    tracing::info!("✅ Created v1 exercise {} ({})", created.id, created.name);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_v1_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(exercise): Json<ExerciseV1>,
) -> Result<Json<ExerciseV1>, AppError> {
    Ok(Json(state.service.update_v1(id, exercise).await?))
}

async fn delete_v1_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.service.delete_v1(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_v2_handler(
    State(state): State<AppState>,
    Query(query): Query<V2Query>,
) -> Result<Json<Vec<ExerciseV2>>, AppError> {
    Ok(Json(state.service.list_v2(&query).await?))
}

async fn get_v2_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ExerciseV2>, AppError> {
    Ok(Json(state.service.get_v2(id).await?))
}

async fn create_v2_handler(
    State(state): State<AppState>,
    Json(exercise): Json<ExerciseV2>,
) -> Result<(StatusCode, Json<ExerciseV2>), AppError> {
    let created = state.service.create_v2(exercise).await?;
    tracing::info!("✅ Created v2 exercise {:?} ({})", created.id, created.slug);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_v2_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(exercise): Json<ExerciseV2>,
) -> Result<Json<ExerciseV2>, AppError> {
    Ok(Json(state.service.update_v2(id, exercise).await?))
}

async fn delete_v2_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.service.delete_v2(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stats_handler(State(state): State<AppState>) -> Result<Json<CatalogStats>, AppError> {
    Ok(Json(state.service.stats().await?))
}

async fn migrate_handler(
    State(state): State<AppState>,
) -> Result<Json<MigrationOutcome>, AppError> {
    let outcome = state.service.migrate_from_v1(&state.v1_data_file).await?;
    tracing::info!("📥 Migration: {:?}", outcome);
    Ok(Json(outcome))
}

// Error handling
struct AppError(CatalogError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Conflict(_) => StatusCode::BAD_REQUEST,
            CatalogError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::UnsupportedBackend(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::error!("❌ Error: {} - {}", status, message);
        } else {
            tracing::debug!("Request rejected: {} - {}", status, message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<CatalogError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
