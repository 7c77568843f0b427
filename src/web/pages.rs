//! HTML rendering — self-contained pages, no template engine.
//!
//! Each function renders one full page from already-resolved data; none of
//! them touch session state or storage.

use axum::http::StatusCode;

use crate::assets::{Asset, AssetKind, Resolution};
use crate::config;
use crate::recommend::Recommendation;
use crate::session::{Notice, NoticeLevel};

/// Login page selector, mirroring the Login/Register option box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Login,
    Register,
}

impl LoginMode {
    pub fn from_query(mode: Option<&str>) -> Self {
        match mode {
            Some("register") => LoginMode::Register,
            _ => LoginMode::Login,
        }
    }
}

/// One rendered result row: the recommendation and its thumbnail.
pub struct ResultRow {
    pub recommendation: Recommendation,
    pub thumbnail: Resolution,
}

pub struct MainView<'a> {
    pub username: Option<&'a str>,
    pub medicines: Vec<&'a str>,
    pub selected: Option<&'a str>,
    pub results: Option<Vec<ResultRow>>,
    pub notice: Option<&'a Notice>,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, sidebar: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · {app}</title>
<style>
*,*::before,*::after{{box-sizing:border-box}}
body{{margin:0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#f5f7fa;color:#1f2937;display:flex;min-height:100vh}}
aside{{width:220px;background:#2b5876;color:#fff;padding:24px}}
aside h2{{font-size:1rem;margin:0 0 12px}}
main{{flex:1;max-width:860px;margin:0 auto;padding:32px}}
h1{{margin:0 0 8px}}
.sub{{color:#4b5563;margin:0 0 24px}}
.notice{{padding:12px 16px;border-radius:8px;margin:0 0 16px}}
.notice.success{{background:#ecfdf5;border:1px solid #a7f3d0;color:#065f46}}
.notice.warning{{background:#fffbeb;border:1px solid #fde68a;color:#92400e}}
form{{margin:0 0 16px}}
label{{display:block;font-weight:600;margin:12px 0 4px}}
input,select{{width:100%;padding:10px;border:1px solid #d1d5db;border-radius:8px;font-size:1rem}}
button{{margin-top:16px;padding:10px 20px;border:none;border-radius:8px;background:#4a90e2;color:#fff;font-size:1rem;font-weight:600;cursor:pointer}}
.tabs a{{margin-right:16px}}
.result{{display:flex;gap:16px;align-items:center;background:#fff;border-radius:12px;padding:12px;margin:0 0 12px;box-shadow:0 2px 8px rgba(0,0,0,.05)}}
.hero img,.hero svg{{width:100%;height:auto;border-radius:12px}}
</style>
</head>
<body>
{sidebar}
<main>
{body}
</main>
</body>
</html>"##,
        title = escape_html(title),
        app = config::APP_NAME,
        sidebar = sidebar,
        body = body,
    )
}

fn notice_html(notice: Option<&Notice>) -> String {
    match notice {
        Some(n) => {
            let class = match n.level {
                NoticeLevel::Success => "success",
                NoticeLevel::Warning => "warning",
            };
            format!(
                r#"<div class="notice {class}" role="status">{}</div>"#,
                escape_html(&n.text)
            )
        }
        None => String::new(),
    }
}

fn image_html(kind: AssetKind, resolution: &Resolution, alt: &str, width: Option<u32>) -> String {
    match &resolution.asset {
        Asset::Located(_) => {
            let width_attr = width.map(|w| format!(r#" width="{w}""#)).unwrap_or_default();
            format!(
                r#"<img src="{src}" alt="{alt}"{width_attr}>"#,
                src = kind.url(),
                alt = escape_html(alt),
            )
        }
        Asset::Placeholder(placeholder) => placeholder.to_svg(),
    }
}

pub fn render_landing(hero: &Resolution, notice: Option<&Notice>) -> String {
    let hero_warning = hero.warning.map(Notice::warning);
    let body = format!(
        r#"<h1>Welcome to {app}</h1>
<p class="sub">Your Personalized Medicine Recommendation System</p>
{notice}{hero_notice}<div class="hero">{hero}</div>
<p>Discover alternative medications tailored to your needs.
Our AI-powered system helps you find suitable substitutes for your prescriptions.</p>
<form method="post" action="/start"><button type="submit">Get Started</button></form>"#,
        app = config::APP_NAME,
        notice = notice_html(notice),
        hero_notice = notice_html(hero_warning.as_ref()),
        hero = image_html(AssetKind::Hero, hero, "MedRec", None),
    );
    layout("Welcome", "", &body)
}

pub fn render_login(mode: LoginMode, notice: Option<&Notice>) -> String {
    let (action, button, login_sel, register_sel) = match mode {
        LoginMode::Login => ("/login", "Login", " selected", ""),
        LoginMode::Register => ("/register", "Register", "", " selected"),
    };

    let body = format!(
        r#"<h1>Login / Register</h1>
{notice}<form method="get" action="/">
<label for="mode">Select Option</label>
<select id="mode" name="mode" onchange="this.form.submit()">
<option value="login"{login_sel}>Login</option>
<option value="register"{register_sel}>Register</option>
</select>
</form>
<form method="post" action="{action}">
<label for="username">Username</label>
<input id="username" name="username" autocomplete="username">
<label for="password">Password</label>
<input id="password" name="password" type="password">
<button type="submit">{button}</button>
</form>"#,
        notice = notice_html(notice),
    );
    layout("Login / Register", "", &body)
}

pub fn render_main(view: &MainView<'_>) -> String {
    let sidebar = format!(
        r#"<aside>
<h2>User Profile</h2>
<p>Logged In{user}</p>
<form method="post" action="/logout"><button type="submit">Logout</button></form>
</aside>"#,
        user = view
            .username
            .map(|u| format!(" as {}", escape_html(u)))
            .unwrap_or_default(),
    );

    let options: String = view
        .medicines
        .iter()
        .map(|name| {
            let selected = if Some(*name) == view.selected { " selected" } else { "" };
            let escaped = escape_html(name);
            format!(r#"<option value="{escaped}"{selected}>{escaped}</option>"#)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let results = match &view.results {
        Some(rows) if !rows.is_empty() => {
            let items: String = rows
                .iter()
                .map(|row| {
                    let rec = &row.recommendation;
                    format!(
                        r#"<div class="result">{thumb}<div><p>{rank}. {name}</p><p><a href="{url}" target="_blank" rel="noopener">Purchase on PharmEasy</a></p></div></div>"#,
                        thumb = image_html(
                            AssetKind::Thumbnail(rec.rank),
                            &row.thumbnail,
                            &rec.name,
                            Some(100)
                        ),
                        rank = rec.rank,
                        name = escape_html(&rec.name),
                        url = escape_html(&rec.purchase_url),
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!("<h2>Recommended Alternatives:</h2>\n{items}")
        }
        Some(_) => "<h2>Recommended Alternatives:</h2>\n<p>No alternatives available.</p>".to_string(),
        None => String::new(),
    };

    let body = format!(
        r#"<h1>Medicine Recommender System</h1>
{notice}<form method="post" action="/recommend">
<label for="medicine">Search for medicine alternatives</label>
<select id="medicine" name="medicine">
{options}
</select>
<button type="submit">Recommend</button>
</form>
{results}"#,
        notice = notice_html(view.notice),
    );
    layout("Medicine Recommender System", &sidebar, &body)
}

pub fn render_error(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"<h1>{code}</h1>
<p>{message}</p>
<p><a href="/">Back to {app}</a></p>"#,
        code = status.as_u16(),
        message = escape_html(message),
        app = config::APP_NAME,
    );
    layout("Error", "", &body)
}
