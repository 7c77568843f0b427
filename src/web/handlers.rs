//! Request handlers: one render cycle per request.
//!
//! Every handler resolves the browser session, applies at most one page
//! event, and renders whichever page the session ends up on.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::assets::{Asset, AssetKind};
use crate::config;
use crate::core_state::{CoreState, SessionHandle};
use crate::credentials::CredentialError;
use crate::recommend::{self, Recommendation};
use crate::session::{Event, Notice, Page};
use crate::web::error::WebError;
use crate::web::pages::{self, LoginMode, MainView, ResultRow};

pub const SESSION_COOKIE: &str = "medrec_session";

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendForm {
    #[serde(default)]
    pub medicine: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub medicines: usize,
}

// ═══════════════════════════════════════════════════════════
// Session cookie
// ═══════════════════════════════════════════════════════════

/// Extract the session token from the `Cookie` header(s).
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn with_session_cookie(mut response: Response, session: &SessionHandle) -> Response {
    if session.is_new {
        let cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict",
            session.id
        );
        if let Ok(val) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, val);
        }
    }
    response
}

fn open_session(core: &CoreState, headers: &HeaderMap) -> SessionHandle {
    let cookie = session_cookie(headers);
    core.session(cookie.as_deref())
}

// ═══════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════

struct PageContent<'a> {
    mode: LoginMode,
    notice: Option<&'a Notice>,
    selected: Option<&'a str>,
    results: Option<Vec<Recommendation>>,
}

impl Default for PageContent<'_> {
    fn default() -> Self {
        Self {
            mode: LoginMode::Login,
            notice: None,
            selected: None,
            results: None,
        }
    }
}

fn render(core: &CoreState, session: &SessionHandle, content: PageContent<'_>) -> Response {
    let html = match session.state.page {
        Page::Landing => {
            let hero = core.assets.resolve(AssetKind::Hero);
            pages::render_landing(&hero, content.notice)
        }
        Page::Login => pages::render_login(content.mode, content.notice),
        Page::Main => {
            let results = content.results.map(|recs| {
                recs.into_iter()
                    .map(|recommendation| ResultRow {
                        thumbnail: core.assets.resolve(AssetKind::Thumbnail(recommendation.rank)),
                        recommendation,
                    })
                    .collect()
            });
            pages::render_main(&MainView {
                username: session.state.username.as_deref(),
                medicines: core.similarity.catalog().names().collect(),
                selected: content.selected,
                results,
                notice: content.notice,
            })
        }
    };
    with_session_cookie(Html(html).into_response(), session)
}

/// Run a credential-store call off the async workers (PBKDF2 is slow by design).
async fn blocking<T, F>(core: &Arc<CoreState>, f: F) -> Result<Result<T, CredentialError>, WebError>
where
    T: Send + 'static,
    F: FnOnce(&CoreState) -> Result<T, CredentialError> + Send + 'static,
{
    let core = Arc::clone(core);
    tokio::task::spawn_blocking(move || f(&core))
        .await
        .map_err(|e| WebError::Internal(format!("credential task: {e}")))
}

fn registration_message(err: &CredentialError) -> String {
    match err {
        CredentialError::DuplicateUser(_) => "Username already exists".to_string(),
        CredentialError::Invalid(reason) => {
            let mut chars = reason.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════
// Page handlers
// ═══════════════════════════════════════════════════════════

/// `GET /` — render the session's current page.
pub async fn index(
    State(core): State<Arc<CoreState>>,
    headers: HeaderMap,
    Query(query): Query<IndexQuery>,
) -> Response {
    let mut session = open_session(&core, &headers);
    let t = core.apply(&mut session, Event::Render);
    render(
        &core,
        &session,
        PageContent {
            mode: LoginMode::from_query(query.mode.as_deref()),
            notice: t.notice.as_ref(),
            ..PageContent::default()
        },
    )
}

/// `POST /start` — "Get Started".
pub async fn start(State(core): State<Arc<CoreState>>, headers: HeaderMap) -> Response {
    let mut session = open_session(&core, &headers);
    let t = core.apply(&mut session, Event::GetStarted);
    render(
        &core,
        &session,
        PageContent {
            notice: t.notice.as_ref(),
            ..PageContent::default()
        },
    )
}

/// `POST /login`
pub async fn login(
    State(core): State<Arc<CoreState>>,
    headers: HeaderMap,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, WebError> {
    let mut session = open_session(&core, &headers);
    core.apply(&mut session, Event::Render);
    if session.state.page != Page::Login {
        return Ok(render(&core, &session, PageContent::default()));
    }

    let CredentialsForm { username, password } = form;
    let user = blocking(&core, move |core| {
        core.credentials.login_user(&username, &password)
    })
    .await??;

    let event = match user {
        Some(user) => Event::LoginSucceeded {
            username: user.username,
        },
        None => Event::LoginFailed,
    };
    let t = core.apply(&mut session, event);
    Ok(render(
        &core,
        &session,
        PageContent {
            notice: t.notice.as_ref(),
            ..PageContent::default()
        },
    ))
}

/// `POST /register`
pub async fn register(
    State(core): State<Arc<CoreState>>,
    headers: HeaderMap,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, WebError> {
    let mut session = open_session(&core, &headers);
    core.apply(&mut session, Event::Render);
    if session.state.page != Page::Login {
        return Ok(render(&core, &session, PageContent::default()));
    }

    let CredentialsForm { username, password } = form;
    let submitted = username.trim().to_string();
    let outcome = blocking(&core, move |core| {
        core.credentials.create_user(&username, &password)
    })
    .await?;

    let (event, mode) = match outcome {
        Ok(()) => (Event::Registered { username: submitted }, LoginMode::Login),
        Err(e) if e.is_recoverable() => (
            Event::RegistrationFailed {
                reason: registration_message(&e),
            },
            LoginMode::Register,
        ),
        Err(e) => return Err(e.into()),
    };

    let t = core.apply(&mut session, event);
    Ok(render(
        &core,
        &session,
        PageContent {
            mode,
            notice: t.notice.as_ref(),
            ..PageContent::default()
        },
    ))
}

/// `POST /logout`
pub async fn logout(State(core): State<Arc<CoreState>>, headers: HeaderMap) -> Response {
    let mut session = open_session(&core, &headers);
    core.apply(&mut session, Event::Logout);
    render(&core, &session, PageContent::default())
}

/// `POST /recommend` — lookup on the main page; not a page transition.
pub async fn recommend(
    State(core): State<Arc<CoreState>>,
    headers: HeaderMap,
    Form(form): Form<RecommendForm>,
) -> Response {
    let mut session = open_session(&core, &headers);
    core.apply(&mut session, Event::Render);
    if session.state.page != Page::Main {
        return render(&core, &session, PageContent::default());
    }

    match recommend::recommend_scored(&core.similarity, &form.medicine) {
        Ok(results) => render(
            &core,
            &session,
            PageContent {
                selected: Some(form.medicine.as_str()),
                results: Some(results),
                ..PageContent::default()
            },
        ),
        Err(e) => {
            tracing::info!(medicine = %form.medicine, "Recommendation for unknown medicine");
            let notice = Notice::warning(e.to_string());
            render(
                &core,
                &session,
                PageContent {
                    notice: Some(&notice),
                    ..PageContent::default()
                },
            )
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Assets and health
// ═══════════════════════════════════════════════════════════

/// `GET /assets/hero`
pub async fn hero_image(State(core): State<Arc<CoreState>>) -> Result<Response, WebError> {
    serve_asset(&core, AssetKind::Hero).await
}

/// `GET /assets/thumb/:slot`
pub async fn thumbnail_image(
    State(core): State<Arc<CoreState>>,
    Path(slot): Path<usize>,
) -> Result<Response, WebError> {
    let kind = AssetKind::thumbnail(slot)
        .ok_or_else(|| WebError::NotFound(format!("No thumbnail slot {slot}")))?;
    serve_asset(&core, kind).await
}

async fn serve_asset(core: &CoreState, kind: AssetKind) -> Result<Response, WebError> {
    match core.assets.resolve(kind).asset {
        Asset::Located(path) => {
            let bytes = tokio::fs::read(&path).await?;
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
        }
        Asset::Placeholder(placeholder) => Ok((
            [(header::CONTENT_TYPE, "image/svg+xml".to_string())],
            placeholder.to_svg(),
        )
            .into_response()),
    }
}

/// `GET /health`
pub async fn health(State(core): State<Arc<CoreState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
        medicines: core.similarity.len(),
    })
}
