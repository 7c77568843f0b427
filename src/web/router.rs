//! Route table and middleware stack.
//!
//! Middleware stack (outermost → innermost):
//! 1. `Cache-Control: no-store` → 2. Access logger → Handler

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::core_state::CoreState;
use crate::web::{handlers, middleware};

/// Build the application router.
pub fn build_router(core: Arc<CoreState>) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    Router::new()
        .route("/", get(handlers::index))
        .route("/start", post(handlers::start))
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/logout", post(handlers::logout))
        .route("/recommend", post(handlers::recommend))
        .route("/assets/hero", get(handlers::hero_image))
        .route("/assets/thumb/:slot", get(handlers::thumbnail_image))
        .route("/health", get(handlers::health))
        .with_state(core)
        .layer(axum::middleware::from_fn(middleware::log_access))
        // Pages carry per-session content.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::core_state::testing::test_core;
    use crate::web::handlers::SESSION_COOKIE;

    fn test_app(images_dir: &std::path::Path) -> Router {
        build_router(Arc::new(test_core(images_dir)))
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    fn cookie_from(response: &Response<Body>) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("new session sets a cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn get_req(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_req(uri: &str, cookie: &str, form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    /// Open a session and move it to the login page.
    async fn session_on_login(app: &Router) -> String {
        let response = app.clone().oneshot(get_req("/", None)).await.unwrap();
        let cookie = cookie_from(&response);
        let response = app
            .clone()
            .oneshot(post_req("/start", &cookie, ""))
            .await
            .unwrap();
        assert!(body_string(response).await.contains(r#"action="/login""#));
        cookie
    }

    #[tokio::test]
    async fn first_visit_renders_landing_and_sets_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app.oneshot(get_req("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(cookie_from(&response).starts_with(&format!("{SESSION_COOKIE}=")));
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );

        let html = body_string(response).await;
        assert!(html.contains("Get Started"));
        assert!(html.contains("Hero image not found - using placeholder"));
    }

    #[tokio::test]
    async fn full_flow_register_login_recommend_logout() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let cookie = session_on_login(&app).await;

        let response = app
            .clone()
            .oneshot(post_req("/register", &cookie, "username=alice&password=s3cret"))
            .await
            .unwrap();
        assert!(body_string(response).await.contains("Account created! Please login."));

        let response = app
            .clone()
            .oneshot(post_req("/login", &cookie, "username=alice&password=s3cret"))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Logged In as alice"));
        assert!(html.contains("Paracetamol"));

        let response = app
            .clone()
            .oneshot(post_req("/recommend", &cookie, "medicine=Paracetamol"))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Recommended Alternatives:"));
        assert!(html.contains("1. Acetaminophen"));
        assert!(html.contains("5. Diclofenac"));
        assert!(html.contains("https://pharmeasy.in/search/all?name=Acetaminophen"));
        assert!(!html.contains("1. Paracetamol"));

        let response = app
            .clone()
            .oneshot(post_req("/logout", &cookie, ""))
            .await
            .unwrap();
        assert!(body_string(response).await.contains("Get Started"));

        let response = app.oneshot(get_req("/", Some(&cookie))).await.unwrap();
        assert!(body_string(response).await.contains("Get Started"));
    }

    #[tokio::test]
    async fn wrong_password_stays_on_login() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let cookie = session_on_login(&app).await;

        app.clone()
            .oneshot(post_req("/register", &cookie, "username=bob&password=right"))
            .await
            .unwrap();
        let response = app
            .oneshot(post_req("/login", &cookie, "username=bob&password=wrong"))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Incorrect Username/Password"));
        assert!(html.contains(r#"action="/login""#));
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let cookie = session_on_login(&app).await;

        app.clone()
            .oneshot(post_req("/register", &cookie, "username=carol&password=one"))
            .await
            .unwrap();
        let response = app
            .oneshot(post_req("/register", &cookie, "username=carol&password=two"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Username already exists"));
    }

    #[tokio::test]
    async fn unknown_medicine_shows_warning() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let cookie = session_on_login(&app).await;

        app.clone()
            .oneshot(post_req("/register", &cookie, "username=dave&password=pw"))
            .await
            .unwrap();
        app.clone()
            .oneshot(post_req("/login", &cookie, "username=dave&password=pw"))
            .await
            .unwrap();
        let response = app
            .oneshot(post_req("/recommend", &cookie, "medicine=Unobtainium"))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Medicine not found: Unobtainium"));
        assert!(!html.contains("Recommended Alternatives:"));
    }

    #[tokio::test]
    async fn recommend_without_login_renders_landing() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let response = app.clone().oneshot(get_req("/", None)).await.unwrap();
        let cookie = cookie_from(&response);

        let response = app
            .oneshot(post_req("/recommend", &cookie, "medicine=Paracetamol"))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Get Started"));
        assert!(!html.contains("Recommended Alternatives:"));
    }

    #[tokio::test]
    async fn register_mode_selected_by_query() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let cookie = session_on_login(&app).await;

        let response = app
            .oneshot(get_req("/?mode=register", Some(&cookie)))
            .await
            .unwrap();
        assert!(body_string(response).await.contains(r#"action="/register""#));
    }

    #[tokio::test]
    async fn placeholder_assets_are_svg() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app.clone().oneshot(get_req("/assets/hero", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );
        assert!(body_string(response).await.contains("#4a90e2"));

        let response = app.oneshot(get_req("/assets/thumb/9", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn located_thumbnail_is_served_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("med_2.jpg"), b"\xFF\xD8\xFFjpeg").unwrap();
        let app = test_app(dir.path());

        let response = app.oneshot(get_req("/assets/thumb/2", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"\xFF\xD8\xFFjpeg");
    }

    #[tokio::test]
    async fn health_reports_catalog_size() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app.oneshot(get_req("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["medicines"], 6);
    }
}
