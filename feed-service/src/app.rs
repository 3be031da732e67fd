use crate::config::Config;
use crate::logger::Logger;
use crate::widgets::{WidgetKind, WidgetService};
use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub logger: Logger,
    pub widgets: Arc<WidgetService>,
}

pub fn build_router(config: Arc<Config>, logger: Logger) -> Router {
    let widgets = Arc::new(WidgetService::new(config.clone(), logger.clone()));
    let state = Arc::new(AppState {
        config,
        logger,
        widgets,
    });

    Router::new()
        .route("/healthz", get(handle_healthz))
        .route("/v1/widgets/{widget}", get(handle_widget))
        .with_state(state)
}

async fn handle_healthz() -> impl IntoResponse {
    StatusCode::OK
}

async fn handle_widget(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Path(widget): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> Response<Body> {
    let request_id = resolve_request_id(&headers);
    let started_at = Instant::now();
    state.logger.debug(
        "request.received",
        json!({
            "requestId": request_id,
            "rawUrl": uri.to_string(),
            "clientIp": remote.ip().to_string(),
        }),
    );

    let Some(kind) = WidgetKind::from_slug(&widget) else {
        let response = json_error(StatusCode::NOT_FOUND, "Unknown widget", &request_id);
        log_complete(&state.logger, started_at, &request_id, &widget, 404, false);
        return response;
    };

    let payload = state.widgets.render(kind).await;
    let stale = payload.stale;
    let body = match serde_json::to_string(&payload) {
        Ok(body) => body,
        Err(_) => {
            let response =
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Render failed", &request_id);
            log_complete(&state.logger, started_at, &request_id, &widget, 500, false);
            return response;
        }
    };

    log_complete(&state.logger, started_at, &request_id, &widget, 200, stale);
    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
        .header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn log_complete(
    logger: &Logger,
    started_at: Instant,
    request_id: &str,
    widget: &str,
    status: u16,
    stale: bool,
) {
    logger.info(
        "request.completed",
        json!({
            "requestId": request_id,
            "widget": widget,
            "statusCode": status,
            "stale": stale,
            "durationMs": started_at.elapsed().as_secs_f64() * 1000.0,
        }),
    );
}

fn json_error(status: StatusCode, message: &str, request_id: &str) -> Response<Body> {
    let body = json!({ "error": message, "requestId": request_id }).to_string();
    Response::builder()
        .status(status)
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
        .body(Body::from(body))
        .unwrap_or_else(|_| status.into_response())
}
