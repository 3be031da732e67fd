use crate::advisor::{AdvisorGate, SessionStatus, build_session_cookie};
use crate::config::Config;
use crate::logger::Logger;
use crate::metrics::SiteMetrics;
use crate::request_context::RequestContextManager;
use crate::static_files::{content_type_header, plan_response, resolve};
use crate::theme::{resolve_season, theme_response, today_utc};
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{ConnectInfo, OriginalUri, Query, State};
use axum::http::{HeaderMap, Method, Response, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use http::HeaderValue;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};

pub async fn build_router(config: Arc<Config>, logger: Logger) -> Result<Router> {
    let advisor = AdvisorGate::new(config.advisor.clone(), logger.clone());
    let metrics = SiteMetrics::new();
    let request_context = RequestContextManager::new(logger.clone(), metrics.clone());

    let state = Arc::new(AppState {
        config,
        advisor,
        request_context,
        metrics,
        logger,
    });

    let request_timeout = state.config.request_timeout;
    let timeout_logger = state.logger.clone();
    let timeout_layer = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(move |error: BoxError| {
            let timeout_logger = timeout_logger.clone();
            async move {
                if error.is::<tower::timeout::error::Elapsed>() {
                    timeout_logger.warn(
                        "router.request_timeout",
                        json!({ "error": error.to_string() }),
                    );
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        Json(json!({ "error": "Request timed out" })),
                    )
                        .into_response()
                } else {
                    timeout_logger.error(
                        "router.unhandled_error",
                        json!({ "error": error.to_string() }),
                    );
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Unhandled server error" })),
                    )
                        .into_response()
                }
            }
        }))
        .layer(TimeoutLayer::new(request_timeout));

    Ok(Router::new()
        .route("/healthz", get(handle_healthz))
        .route("/internal/status", get(handle_internal_status))
        .route("/api/theme", get(handle_theme))
        .route("/api/theme/preference", get(handle_theme_preference_get))
        .route("/api/theme/preference", post(handle_theme_preference_post))
        .route("/api/advisor/login", post(handle_advisor_login))
        .route("/api/advisor/session", get(handle_advisor_session))
        .route("/api/advisor/logout", post(handle_advisor_logout))
        .fallback(handle_static)
        .with_state(state.clone())
        .layer(timeout_layer))
}

pub struct AppState {
    pub config: Arc<Config>,
    pub advisor: AdvisorGate,
    pub request_context: RequestContextManager,
    pub metrics: SiteMetrics,
    pub logger: Logger,
}

async fn handle_healthz() -> impl IntoResponse {
    axum::Json(json!({"status": "ok"}))
}

async fn handle_internal_status(State(state): State<Arc<AppState>>) -> Response<Body> {
    let snapshot = state.metrics.snapshot();
    json_response(
        StatusCode::OK,
        serde_json::to_value(snapshot).unwrap_or_else(|_| json!({ "status": "ok" })),
        HeaderMap::new(),
    )
}

async fn handle_theme(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response<Body> {
    let season = resolve_season(params.get("theme").map(String::as_str), today_utc());
    let payload = theme_response(season, &state.config.theme);
    json_response(
        StatusCode::OK,
        serde_json::to_value(&payload).unwrap_or_else(|_| json!({})),
        HeaderMap::new(),
    )
}

const THEME_PREFERENCE_COOKIE: &str = "theme";
const THEME_PREFERENCES: &[&str] = &["light", "dark", "system"];

async fn handle_theme_preference_get(headers: HeaderMap) -> Response<Body> {
    let preference = cookie_value(&headers, THEME_PREFERENCE_COOKIE)
        .filter(|value| THEME_PREFERENCES.contains(&value.as_str()))
        .unwrap_or_else(|| "system".to_string());
    json_response(
        StatusCode::OK,
        json!({ "preference": preference }),
        HeaderMap::new(),
    )
}

#[derive(Deserialize)]
struct PreferenceRequest {
    preference: String,
}

async fn handle_theme_preference_post(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    bytes: axum::body::Bytes,
) -> Response<Body> {
    let context = state
        .request_context
        .start(Method::POST, &uri, &headers, Some(&remote));
    let Ok(request) = serde_json::from_slice::<PreferenceRequest>(&bytes) else {
        context.complete(400, json!({"route": "theme-preference"}));
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({"error": "Expected {\"preference\": ...}"}),
            HeaderMap::new(),
        );
    };
    if !THEME_PREFERENCES.contains(&request.preference.as_str()) {
        context.complete(422, json!({"route": "theme-preference"}));
        return json_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"error": "Unknown preference", "allowed": THEME_PREFERENCES}),
            HeaderMap::new(),
        );
    }
    let mut response_headers = HeaderMap::new();
    let cookie = format!(
        "{}={}; Max-Age=31536000; Path=/; SameSite=Lax",
        THEME_PREFERENCE_COOKIE, request.preference
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response_headers.insert(header::SET_COOKIE, value);
    }
    context.complete(200, json!({"route": "theme-preference"}));
    json_response(
        StatusCode::OK,
        json!({ "preference": request.preference }),
        response_headers,
    )
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

async fn handle_advisor_login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    bytes: axum::body::Bytes,
) -> Response<Body> {
    let context = state
        .request_context
        .start(Method::POST, &uri, &headers, Some(&remote));

    let Ok(request) = serde_json::from_slice::<LoginRequest>(&bytes) else {
        context.complete(400, json!({"route": "advisor-login"}));
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({"error": "Expected {\"password\": ...}"}),
            HeaderMap::new(),
        );
    };

    match state.advisor.login(&request.password).await {
        Some(session) => {
            let mut response_headers = HeaderMap::new();
            response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            let cookie = build_session_cookie(
                state.advisor.cookie_name(),
                &session.token,
                state.advisor.session_ttl(),
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response_headers.insert(header::SET_COOKIE, value);
            }
            context.complete(200, json!({"route": "advisor-login"}));
            json_response(
                StatusCode::OK,
                json!({
                    "authenticated": true,
                    "expiresInSeconds": session.expires_in_seconds,
                }),
                response_headers,
            )
        }
        None => {
            context.complete(401, json!({"route": "advisor-login", "reason": "bad-password"}));
            json_response(
                StatusCode::UNAUTHORIZED,
                json!({"authenticated": false, "error": "Invalid password"}),
                HeaderMap::new(),
            )
        }
    }
}

async fn handle_advisor_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response<Body> {
    match state.advisor.validate(&headers).await {
        SessionStatus::Valid => json_response(
            StatusCode::OK,
            json!({"authenticated": true}),
            HeaderMap::new(),
        ),
        SessionStatus::Expired => json_response(
            StatusCode::UNAUTHORIZED,
            json!({"authenticated": false, "error": "Session expired"}),
            HeaderMap::new(),
        ),
        SessionStatus::Missing => json_response(
            StatusCode::UNAUTHORIZED,
            json!({"authenticated": false, "error": "Session required"}),
            HeaderMap::new(),
        ),
    }
}

async fn handle_advisor_logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response<Body> {
    state.advisor.logout(&headers).await;
    let mut response_headers = HeaderMap::new();
    let cookie = format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Strict",
        state.advisor.cookie_name()
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response_headers.insert(header::SET_COOKIE, value);
    }
    json_response(StatusCode::OK, json!({"authenticated": false}), response_headers)
}

async fn handle_static(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
) -> Response<Body> {
    let context = state
        .request_context
        .start(method.clone(), &uri, &headers, Some(&remote));

    if method != Method::GET && method != Method::HEAD {
        context.complete(405, json!({"route": "static"}));
        return json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({"error": "Method Not Allowed"}),
            HeaderMap::new(),
        );
    }

    let Some(file) = resolve(&state.config.web_root, uri.path()).await else {
        context.complete(404, json!({"route": "static", "reason": "not-found"}));
        return json_response(
            StatusCode::NOT_FOUND,
            json!({"error": "Not Found"}),
            HeaderMap::new(),
        );
    };

    let plan = plan_response(
        file,
        &headers,
        state.config.gzip_min_bytes,
        state.config.asset_max_age,
    );
    if plan.gzipped {
        state.metrics.record_gzip();
    }

    let mut builder = Response::builder()
        .status(plan.status)
        .header(header::CONTENT_TYPE, content_type_header(&plan.content_type))
        .header(header::CACHE_CONTROL, plan.cache_control)
        .header(header::VARY, "Accept-Encoding");
    if plan.gzipped {
        builder = builder.header(header::CONTENT_ENCODING, "gzip");
    }

    let status = plan.status.as_u16();
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(plan.body)
    };
    context.complete(status, json!({"route": "static", "gzip": plan.gzipped}));
    builder.body(body).unwrap_or_else(|_| {
        Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::empty())
            .expect("failed to build static response")
    })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').map(|segment| segment.trim()).find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        if parts.next()?.trim() != name {
            return None;
        }
        let value = parts.next()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn json_response(
    status: StatusCode,
    body: serde_json::Value,
    mut headers: HeaderMap,
) -> Response<Body> {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let mut builder = Response::builder().status(status);
    *builder.headers_mut().unwrap() = headers;
    builder
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::from("{}"))
                .expect("failed to build JSON response")
        })
}
