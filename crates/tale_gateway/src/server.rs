use crate::error::ApiError;
use crate::types::{
    AudioPayload, HealthResponse, SpeechRequest, StoryQuery, StoryResponse, VoiceHealth,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderValue, StatusCode},
    routing::get,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tale_core::{ApplicationConfig, ChildProfile, Repository, Story, StoryRequest};
use tale_generation::StoryGenerator;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    app: Arc<ApplicationConfig>,
    pipeline: StoryGenerator,
    children: Arc<dyn Repository<ChildProfile>>,
    stories: Arc<dyn Repository<Story>>,
}

impl AppState {
    pub fn new(
        app: ApplicationConfig,
        pipeline: StoryGenerator,
        children: Arc<dyn Repository<ChildProfile>>,
        stories: Arc<dyn Repository<Story>>,
    ) -> Self {
        Self {
            app: Arc::new(app),
            pipeline,
            children,
            stories,
        }
    }
}

/// CORS from `APP_CORS_ORIGINS`; a `*` entry allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o.trim() == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.app.cors_origins);
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/stories", post(generate_story).get(list_stories))
        .route("/api/v1/stories/:id", get(get_story).delete(delete_story))
        .route("/api/v1/children", post(create_child).get(list_children))
        .route("/api/v1/children/:id", get(get_child).delete(delete_child))
        .route("/api/v1/speech", post(speech))
        .layer(cors)
        .with_state(state)
}

/// The HTTP server for the story API.
pub struct GatewayServer {
    state: AppState,
    addr: String,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        let addr = state.app.bind_address();
        Self { state, addr }
    }

    pub fn address(&self) -> &str {
        &self.addr
    }

    /// Bind and serve until Ctrl-C.
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        tracing::info!(
            environment = %self.state.app.environment,
            "Gateway listening on {}",
            self.addr
        );
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let voice = state.pipeline.voice();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.app.environment.to_string(),
        voice: VoiceHealth {
            default_provider: voice.registry().default_provider_name().to_string(),
            providers: voice.provider_status(),
        },
    })
}

/// POST /api/v1/stories
async fn generate_story(
    State(state): State<AppState>,
    payload: Result<Json<StoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoryResponse>), ApiError> {
    let request = body(payload)?;
    let generated = state.pipeline.generate(&request).await?;
    Ok((StatusCode::CREATED, Json(generated.into())))
}

async fn list_stories(
    State(state): State<AppState>,
    Query(query): Query<StoryQuery>,
) -> Result<Json<Vec<Story>>, ApiError> {
    let stories = match query.child_id.as_deref() {
        Some(child_id) => state.stories.list_by("child_id", child_id).await?,
        None => state.stories.list().await?,
    };
    Ok(Json(stories))
}

async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Story>, ApiError> {
    state
        .stories
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("story {id} not found")))
}

async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.stories.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("story {id} not found")))
    }
}

/// POST /api/v1/children
async fn create_child(
    State(state): State<AppState>,
    payload: Result<Json<ChildProfile>, JsonRejection>,
) -> Result<(StatusCode, Json<ChildProfile>), ApiError> {
    let mut child = body(payload)?;
    child.name = child.name.trim().to_string();
    child
        .validate()
        .map_err(|msg| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "validation", msg))?;
    let saved = state.children.save(&child).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn list_children(State(state): State<AppState>) -> Result<Json<Vec<ChildProfile>>, ApiError> {
    Ok(Json(state.children.list().await?))
}

async fn get_child(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChildProfile>, ApiError> {
    state
        .children
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("child {id} not found")))
}

async fn delete_child(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.children.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("child {id} not found")))
    }
}

/// POST /api/v1/speech
async fn speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Json<AudioPayload>, ApiError> {
    let request = body(payload)?;
    let voice = state.pipeline.voice();
    let encoding = request.encoding.unwrap_or_else(|| voice.default_encoding());
    let result = voice
        .synthesize(&request.text, &request.language, encoding)
        .await?;
    Ok(Json(AudioPayload::from(&result)))
}
