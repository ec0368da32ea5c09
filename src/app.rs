//! HTTP surface of the gateway.

use crate::ai::{
    ChatService, ImageGenerationService, WorkersAiChatClient, WorkersAiHttpClient,
    WorkersAiImageClient,
};
use crate::gateway::{parse_body, Gateway};
use crate::models::{Config, Detail, ErrorEnvelope, ModelInfo, ModelName};
use crate::{Error, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

pub const UP_MESSAGE: &str = "Picture AI gateway is up!";

/// Owns the gateway and the address it is served on.
pub struct App {
    gateway: Arc<Gateway>,
    bind_addr: SocketAddr,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub chat: Arc<dyn ChatService>,
    pub image_gen: Arc<dyn ImageGenerationService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, bind_addr: SocketAddr) -> Self {
        Self {
            gateway: Arc::new(Gateway::new(services.chat, services.image_gen)),
            bind_addr,
        }
    }

    /// Construct an app from gateway configuration (see `Config::from_env`).
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();
        let workers_client = || {
            WorkersAiHttpClient::new_with_client(
                config.account_id.clone(),
                config.api_token.clone(),
                config.provider_timeout,
                http_client.clone(),
            )
            .with_base_url(config.provider_base_url.clone())
        };

        info!("Chat model: {}", config.chat_model);
        for model in ModelName::ALL {
            info!("Image model {}: {}", model, model.provider_id());
        }

        Self::with_services(
            AppServices {
                chat: Arc::new(WorkersAiChatClient::new(
                    workers_client(),
                    config.chat_model.clone(),
                )),
                image_gen: Arc::new(WorkersAiImageClient::new(workers_client())),
            },
            config.bind_addr,
        )
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(root))
            .route("/models", get(list_models))
            .route("/ask", post(ask))
            .route("/generate-image", post(generate_image))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %Uuid::new_v4()
                    )
                }),
            )
            .layer(CorsLayer::permissive())
            .with_state(self.gateway.clone())
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener until Ctrl-C.
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        info!("Gateway listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Failure surfaced to the caller as `{ "error": ... }`. The status stays
/// 200 on every route.
#[derive(Debug)]
struct ApiError {
    route: &'static str,
    error: Error,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(route = self.route, "{} Error: {}", self.route, self.error);

        let envelope = ErrorEnvelope {
            error: self.error.to_string(),
        };
        (StatusCode::OK, Json(envelope)).into_response()
    }
}

/// Body extraction failures (oversized, aborted) share the envelope path.
fn rejected_body(rejection: BytesRejection) -> Error {
    Error::InvalidBody(rejection.body_text())
}

async fn root() -> Json<Detail<&'static str>> {
    Json(Detail::new(UP_MESSAGE))
}

async fn list_models() -> Json<Detail<Vec<ModelInfo>>> {
    Json(Detail::new(
        ModelName::ALL.into_iter().map(ModelInfo::from).collect(),
    ))
}

async fn ask(
    State(gateway): State<Arc<Gateway>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<Detail<Value>>, ApiError> {
    let at = |error: Error| ApiError {
        route: "POST /ask",
        error,
    };

    let body = body.map_err(rejected_body).map_err(at)?;
    let request = parse_body(&body).map_err(at)?;
    let detail = gateway.ask(request).await.map_err(at)?;

    Ok(Json(detail))
}

async fn generate_image(
    State(gateway): State<Arc<Gateway>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Response, ApiError> {
    let at = |error: Error| ApiError {
        route: "POST /generate-image",
        error,
    };

    let body = body.map_err(rejected_body).map_err(at)?;
    let request = parse_body(&body).map_err(at)?;
    let image = gateway.generate_image(request).await.map_err(at)?;

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response())
}
