use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use site_server::build_router;
use site_server::config::Config;
use site_server::logger::Logger;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn static_theme_and_advisor_flow() {
    let web_root = make_web_root();
    set_env(&web_root);

    let logger = Logger::new("site-server-test");
    let config = Arc::new(Config::load(&logger).expect("config load"));
    let router = build_router(config, logger).await.unwrap();

    // Root serves index.html.
    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache"
    );
    let body = body_string(response.into_body()).await;
    assert!(body.contains("home page"));

    // Clean URL with gzip negotiation.
    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/notes")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_ENCODING)
            .map(|value| value.to_str().unwrap()),
        Some("gzip")
    );

    // Unknown path falls back to the 404 page.
    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/definitely-not-here")
        .body(Body::empty())
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_string(response.into_body()).await;
    assert!(body.contains("lost"));

    // Forced theme override.
    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/api/theme?theme=christmas")
        .body(Body::empty())
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    let body: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert_eq!(body["season"], "christmas");
    assert_eq!(body["stylesheet"], "/css/christmas.css");

    // Wrong password is rejected.
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/advisor/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"password":"nope"}"#))
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The known password logs in and the cookie validates.
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/advisor/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"password":"greatscott"}"#))
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/api/advisor/session")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No cookie, no session.
    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/api/advisor/session")
        .body(Body::empty())
        .unwrap();
    add_connect_info(&mut request);
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let _ = std::fs::remove_dir_all(&web_root);
}

fn make_web_root() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("site-flow-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<html>home page</html>").unwrap();
    std::fs::write(
        dir.join("notes.html"),
        format!("<html>{}</html>", "n".repeat(4096)),
    )
    .unwrap();
    std::fs::write(dir.join("404.html"), "<html>lost</html>").unwrap();
    dir
}

fn set_env(web_root: &PathBuf) {
    unsafe {
        std::env::set_var("PORT", "18080");
        std::env::set_var("WEB_ROOT", web_root.display().to_string());
        std::env::set_var("GZIP_MIN_BYTES", "1024");
    }
}

fn add_connect_info(request: &mut Request<Body>) {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
}

async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

async fn body_string(body: Body) -> String {
    String::from_utf8(body_bytes(body).await).unwrap()
}
