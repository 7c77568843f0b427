//! Page controller: the landing → login → main state machine.
//!
//! `transition` is pure: it takes the current `SessionState` and an `Event`
//! and returns the next state plus an optional notice for the page. The web
//! layer owns rendering; `SessionStore` keeps one state per browser session.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Idle sessions older than this are dropped on the next insert.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Session count above which expired entries are swept on insert.
const SESSION_CLEANUP_THRESHOLD: usize = 1000;

/// Longest gap between sweeps of expired sessions.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Login,
    Main,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Landing => "landing",
            Page::Login => "login",
            Page::Main => "main",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub page: Page,
    pub logged_in: bool,
    pub username: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            page: Page::Landing,
            logged_in: false,
            username: None,
        }
    }
}

/// User-initiated triggers. `Render` is a plain page load with no trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Render,
    GetStarted,
    LoginSucceeded { username: String },
    LoginFailed,
    Registered { username: String },
    RegistrationFailed { reason: String },
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub notice: Option<Notice>,
}

impl Transition {
    fn to(state: SessionState) -> Self {
        Self { state, notice: None }
    }

    fn with_notice(state: SessionState, notice: Notice) -> Self {
        Self {
            state,
            notice: Some(notice),
        }
    }
}

/// Apply `event` to `state`. Events that do not apply to the current page
/// leave the state as it is.
pub fn transition(state: &SessionState, event: Event) -> Transition {
    let on = |page: Page| SessionState {
        page,
        ..state.clone()
    };

    match (state.page, event) {
        (Page::Landing, Event::GetStarted) => Transition::to(on(Page::Login)),

        (Page::Login, Event::LoginSucceeded { username }) => Transition::with_notice(
            SessionState {
                page: Page::Main,
                logged_in: true,
                username: Some(username.clone()),
            },
            Notice::success(format!("Logged In as {username}")),
        ),
        (Page::Login, Event::LoginFailed) => Transition::with_notice(
            on(Page::Login),
            Notice::warning("Incorrect Username/Password"),
        ),
        (Page::Login, Event::Registered { .. }) => Transition::with_notice(
            on(Page::Login),
            Notice::success("Account created! Please login."),
        ),
        (Page::Login, Event::RegistrationFailed { reason }) => {
            Transition::with_notice(on(Page::Login), Notice::warning(reason))
        }

        (Page::Main, Event::Logout) => Transition::to(SessionState {
            page: Page::Landing,
            logged_in: false,
            username: None,
        }),
        // Corrective redirect: main is only reachable with an active login.
        (Page::Main, _) if !state.logged_in => Transition::to(on(Page::Login)),

        _ => Transition::to(state.clone()),
    }
}

struct StoredSession {
    state: SessionState,
    last_seen: Instant,
}

struct SessionMap {
    entries: HashMap<String, StoredSession>,
    last_sweep: Instant,
}

/// Per-browser session states keyed by an opaque token. Writes survive a
/// poisoned lock.
pub struct SessionStore {
    sessions: RwLock<SessionMap>,
    idle_ttl: Duration,
    sweep_interval: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_timing(SESSION_IDLE_TTL, SESSION_SWEEP_INTERVAL)
    }

    pub fn with_timing(idle_ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            sessions: RwLock::new(SessionMap {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            idle_ttl,
            sweep_interval,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionMap> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionMap> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Session store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Current state for `id`, or `None` if unknown or expired.
    pub fn get(&self, id: &str) -> Option<SessionState> {
        self.read()
            .entries
            .get(id)
            .filter(|s| s.last_seen.elapsed() < self.idle_ttl)
            .map(|s| s.state.clone())
    }

    /// Start a fresh session at the landing page. Returns its token.
    pub fn create(&self) -> String {
        let id = generate_session_id();
        self.put(&id, SessionState::default());
        id
    }

    /// Store `state` under `id`, refreshing its idle timer. Expired entries
    /// are swept once per sweep interval or when the map grows large.
    pub fn put(&self, id: &str, state: SessionState) {
        let mut sessions = self.write();

        if sessions.entries.len() > SESSION_CLEANUP_THRESHOLD
            || sessions.last_sweep.elapsed() >= self.sweep_interval
        {
            let ttl = self.idle_ttl;
            let before = sessions.entries.len();
            sessions.entries.retain(|_, s| s.last_seen.elapsed() < ttl);
            sessions.last_sweep = Instant::now();
            let swept = before - sessions.entries.len();
            if swept > 0 {
                tracing::debug!(swept, "Expired sessions removed");
            }
        }

        sessions.entries.insert(
            id.to_string(),
            StoredSession {
                state,
                last_seen: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Random session token (URL-safe base64, 32 bytes of entropy).
pub fn generate_session_id() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
